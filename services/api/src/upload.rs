//! Multipart car forms and the image upload pipeline
//!
//! A car form carries text fields plus files under `images` (or `image`, as
//! sent by the edit form). Every file becomes one stored object. Writes for
//! a request run concurrently and are all awaited before the caller saves
//! the car; if any fails, the ones that succeeded are removed again.

use axum::extract::Multipart;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use storage::{NewObject, ObjectStore};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{error::ApiError, models::CarChanges};

/// One uploaded file, buffered
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Raw multipart car form
#[derive(Debug, Default)]
pub struct CarForm {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub images: Vec<ImageUpload>,
}

/// Validated car attributes
#[derive(Debug, Clone, PartialEq)]
pub struct CarDetails {
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub description: String,
}

impl CarForm {
    /// Validate a creation form: every attribute is required
    pub fn into_details(self) -> Result<(CarDetails, Vec<ImageUpload>), ApiError> {
        let details = CarDetails {
            name: required(self.name, "Name")?,
            brand: required(self.brand, "Brand")?,
            price: parse_price(self.price.as_deref().unwrap_or_default())?,
            description: required(self.description, "Description")?,
        };
        Ok((details, self.images))
    }

    /// Validate an update form: absent attributes stay unchanged, present
    /// ones follow the creation rules
    pub fn into_changes(self) -> Result<(CarChanges, Vec<ImageUpload>), ApiError> {
        let changes = CarChanges {
            name: self.name.map(|v| required(Some(v), "Name")).transpose()?,
            brand: self.brand.map(|v| required(Some(v), "Brand")).transpose()?,
            price: self.price.as_deref().map(parse_price).transpose()?,
            description: self
                .description
                .map(|v| required(Some(v), "Description"))
                .transpose()?,
            images: None,
        };
        Ok((changes, self.images))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{} is required", field))),
    }
}

fn parse_price(value: &str) -> Result<f64, ApiError> {
    match value.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ApiError::BadRequest(
            "Price must be a non-negative number".to_string(),
        )),
    }
}

/// Read a multipart car form, buffering its files
pub async fn read_car_form(mut multipart: Multipart, max_images: usize) -> Result<CarForm, ApiError> {
    let mut form = CarForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "images" | "image" => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;

                // Browsers send an empty part for an untouched file input, and
                // an empty object could never be served back
                if data.is_empty() {
                    debug!("Skipping empty file part {:?}", original_name);
                    continue;
                }

                if !content_type.starts_with("image/") {
                    return Err(ApiError::BadRequest(
                        "Only image uploads are allowed".to_string(),
                    ));
                }

                if form.images.len() >= max_images {
                    return Err(ApiError::BadRequest(format!(
                        "Too many images (max {})",
                        max_images
                    )));
                }

                form.images.push(ImageUpload {
                    original_name,
                    content_type,
                    data,
                });
            }
            "name" | "brand" | "price" | "description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;

                let slot = match name.as_str() {
                    "name" => &mut form.name,
                    "brand" => &mut form.brand,
                    "price" => &mut form.price,
                    _ => &mut form.description,
                };
                *slot = Some(value);
            }
            // The owner comes from the token, never from the form
            _ => {}
        }
    }

    Ok(form)
}

/// Keep the last path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`
pub fn sanitize_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored-object name for an upload: `<unix-millis>-<8 hex>-<name>`
pub fn object_filename(original: &str, now: DateTime<Utc>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        now.timestamp_millis(),
        &id[..8],
        sanitize_filename(original)
    )
}

/// Write every image and wait for all writes. Returns the stored filenames in
/// upload order.
pub async fn store_images(
    objects: &dyn ObjectStore,
    images: Vec<ImageUpload>,
) -> Result<Vec<String>, ApiError> {
    let now = Utc::now();
    let uploads = images.into_iter().map(|image| {
        objects.upload(NewObject {
            filename: object_filename(&image.original_name, now),
            content_type: image.content_type,
            data: image.data,
        })
    });

    let mut stored = Vec::new();
    let mut failure = None;
    for result in join_all(uploads).await {
        match result {
            Ok(object) => stored.push(object.filename),
            Err(e) if failure.is_none() => failure = Some(e),
            Err(e) => warn!("Additional image upload failure: {}", e),
        }
    }

    if let Some(e) = failure {
        error!("Image upload failed, removing {} stored images", stored.len());
        discard_images(objects, &stored).await;
        return Err(ApiError::Storage(e));
    }

    Ok(stored)
}

/// Best-effort removal of objects written for a request that did not complete
pub async fn discard_images(objects: &dyn ObjectStore, filenames: &[String]) {
    let deletes = filenames.iter().map(|name| objects.delete(name));
    for (name, result) in filenames.iter().zip(join_all(deletes).await) {
        if let Err(e) = result {
            warn!("Failed to remove orphaned image {}: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::{Download, MemoryBucket, StorageError, StorageResult, StoredObject};

    /// Memory bucket whose `fail_on`-th upload fails
    struct FlakyBucket {
        inner: MemoryBucket,
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl FlakyBucket {
        fn new(fail_on: usize) -> Self {
            Self {
                inner: MemoryBucket::new(),
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FlakyBucket {
        async fn upload(&self, object: NewObject) -> StorageResult<StoredObject> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(StorageError::AlreadyExists(object.filename));
            }
            self.inner.upload(object).await
        }

        async fn find(&self, filename: &str) -> StorageResult<Option<StoredObject>> {
            self.inner.find(filename).await
        }

        async fn open_download_stream(&self, filename: &str) -> StorageResult<Option<Download>> {
            self.inner.open_download_stream(filename).await
        }

        async fn delete(&self, filename: &str) -> StorageResult<bool> {
            self.inner.delete(filename).await
        }
    }

    fn form() -> CarForm {
        CarForm {
            name: Some(" Civic ".to_string()),
            brand: Some("Honda".to_string()),
            price: Some("19999.5".to_string()),
            description: Some("Reliable".to_string()),
            images: vec![],
        }
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload {
            original_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn test_details_are_trimmed_and_parsed() {
        let (details, _) = form().into_details().unwrap();
        assert_eq!(details.name, "Civic");
        assert_eq!(details.price, 19999.5);
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let err = CarForm {
            name: None,
            ..form()
        }
        .into_details()
        .unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        let err = CarForm {
            description: Some("   ".to_string()),
            ..form()
        }
        .into_details()
        .unwrap_err();
        assert_eq!(err.to_string(), "Description is required");
    }

    #[test]
    fn test_bad_prices_are_rejected() {
        for price in ["", "abc", "-1", "NaN", "inf"] {
            let err = CarForm {
                price: Some(price.to_string()),
                ..form()
            }
            .into_details()
            .unwrap_err();
            assert_eq!(err.to_string(), "Price must be a non-negative number");
        }
    }

    #[test]
    fn test_changes_only_cover_present_fields() {
        let (changes, _) = CarForm {
            price: Some("100".to_string()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.price, Some(100.0));
        assert!(changes.name.is_none());
        assert!(changes.images.is_none());

        assert!(
            CarForm {
                brand: Some(String::new()),
                ..Default::default()
            }
            .into_changes()
            .is_err()
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("car.png"), "car.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\my car.jpg"), "my_car.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "image");
    }

    #[test]
    fn test_object_filename_shape() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let name = object_filename("my car.png", now);
        let parts: Vec<&str> = name.splitn(3, '-').collect();
        assert_eq!(parts[0], "1700000000123");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], "my_car.png");
        assert_ne!(object_filename("a.png", now), object_filename("a.png", now));
    }

    #[tokio::test]
    async fn test_store_images_awaits_every_write() {
        let bucket = MemoryBucket::new();
        let names = store_images(&bucket, vec![png("a.png"), png("b.png"), png("a.png")])
            .await
            .unwrap();

        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("-a.png"));
        assert!(names[1].ends_with("-b.png"));
        assert_eq!(bucket.len().await, 3);
        for name in &names {
            assert!(bucket.find(name).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_discard_images() {
        let bucket = MemoryBucket::new();
        let names = store_images(&bucket, vec![png("a.png"), png("b.png")])
            .await
            .unwrap();

        discard_images(&bucket, &names).await;
        assert!(bucket.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_upload_removes_the_others() {
        let bucket = FlakyBucket::new(2);
        let result = store_images(&bucket, vec![png("a.png"), png("b.png"), png("c.png")]).await;

        assert!(matches!(result, Err(ApiError::Storage(_))));
        assert_eq!(bucket.calls.load(Ordering::SeqCst), 3);
        assert!(bucket.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_single_failed_upload_leaves_nothing() {
        let bucket = FlakyBucket::new(1);
        let result = store_images(&bucket, vec![png("a.png")]).await;

        assert!(result.is_err());
        assert!(bucket.inner.is_empty().await);
    }
}
