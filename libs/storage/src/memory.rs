//! In-process bucket
//!
//! Used for local runs without a database and by the test suites. Objects
//! are chunked exactly like the PostgreSQL bucket so streaming behaves the
//! same way.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures_util::stream;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    ByteStream, Download, ObjectStore, chunk,
    error::{StorageError, StorageResult},
    models::{NewObject, StoredObject},
};

#[derive(Debug)]
struct MemoryObject {
    info: StoredObject,
    chunks: Vec<Bytes>,
}

/// Object store kept in memory
#[derive(Debug, Clone)]
pub struct MemoryBucket {
    objects: Arc<Mutex<HashMap<String, MemoryObject>>>,
    chunk_size: usize,
}

impl Default for MemoryBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            chunk_size: chunk::DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> StorageResult<Self> {
        if chunk_size == 0 || chunk_size > i32::MAX as usize {
            return Err(StorageError::InvalidChunkSize(chunk_size));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Remove several objects at once, returning how many existed
    pub async fn delete_many(&self, filenames: &[String]) -> u64 {
        let mut objects = self.objects.lock().await;
        filenames
            .iter()
            .filter(|name| objects.remove(name.as_str()).is_some())
            .count() as u64
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryBucket {
    async fn upload(&self, object: NewObject) -> StorageResult<StoredObject> {
        let mut objects = self.objects.lock().await;
        if objects.contains_key(&object.filename) {
            return Err(StorageError::AlreadyExists(object.filename));
        }

        let info = StoredObject {
            id: Uuid::new_v4(),
            filename: object.filename.clone(),
            content_type: object.content_type,
            length: object.data.len() as i64,
            chunk_size: self.chunk_size as i32,
            upload_date: Utc::now(),
        };
        let chunks = chunk::split(&object.data, self.chunk_size);

        objects.insert(object.filename, MemoryObject {
            info: info.clone(),
            chunks,
        });
        Ok(info)
    }

    async fn find(&self, filename: &str) -> StorageResult<Option<StoredObject>> {
        let objects = self.objects.lock().await;
        Ok(objects.get(filename).map(|o| o.info.clone()))
    }

    async fn open_download_stream(&self, filename: &str) -> StorageResult<Option<Download>> {
        let objects = self.objects.lock().await;
        let Some(object) = objects.get(filename) else {
            return Ok(None);
        };

        let chunks = object.chunks.clone();
        let stream: ByteStream = Box::pin(stream::iter(chunks.into_iter().map(Ok)));
        Ok(Some(Download {
            info: object.info.clone(),
            stream,
        }))
    }

    async fn delete(&self, filename: &str) -> StorageResult<bool> {
        let mut objects = self.objects.lock().await;
        Ok(objects.remove(filename).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    fn image(name: &str, data: &'static [u8]) -> NewObject {
        NewObject {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn test_upload_then_stream_back() {
        let bucket = MemoryBucket::new().with_chunk_size(3).unwrap();
        let stored = bucket.upload(image("a.png", b"0123456")).await.unwrap();
        assert_eq!(stored.length, 7);
        assert_eq!(stored.chunk_size, 3);

        let download = bucket.open_download_stream("a.png").await.unwrap().unwrap();
        assert_eq!(download.info.content_type, "image/png");

        let chunks: Vec<Bytes> = download.stream.try_collect().await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), b"0123456");
    }

    #[tokio::test]
    async fn test_duplicate_filename_is_rejected() {
        let bucket = MemoryBucket::new();
        bucket.upload(image("a.png", b"1")).await.unwrap();

        let err = bucket.upload(image("a.png", b"2")).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(name) if name == "a.png"));
    }

    #[tokio::test]
    async fn test_missing_object() {
        let bucket = MemoryBucket::new();
        assert!(bucket.find("nope").await.unwrap().is_none());
        assert!(bucket.open_download_stream("nope").await.unwrap().is_none());
        assert!(!bucket.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_many() {
        let bucket = MemoryBucket::new();
        bucket.upload(image("a.png", b"1")).await.unwrap();
        bucket.upload(image("b.png", b"2")).await.unwrap();
        bucket.upload(image("c.png", b"3")).await.unwrap();

        let removed = bucket
            .delete_many(&["a.png".to_string(), "c.png".to_string(), "x.png".to_string()])
            .await;
        assert_eq!(removed, 2);
        assert_eq!(bucket.len().await, 1);
        assert!(bucket.find("b.png").await.unwrap().is_some());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        assert!(matches!(
            MemoryBucket::new().with_chunk_size(0),
            Err(StorageError::InvalidChunkSize(0))
        ));
    }
}
