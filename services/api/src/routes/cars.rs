//! Car listing endpoints
//!
//! Reads are public. Creating, updating and deleting need a bearer token, and
//! only the owner of a car may change it.

use auth::middleware::AuthUser;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Car, NewCar},
    state::AppState,
    upload::{discard_images, read_car_form, store_images},
};

const CAR_NOT_FOUND: &str = "Car not found";
const NOT_OWNER: &str = "Not authorized to modify this car";

fn parse_car_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid car id".to_string()))
}

fn internal(context: &str) -> impl FnOnce(anyhow::Error) -> ApiError + '_ {
    move |e| {
        error!("{}: {}", context, e);
        ApiError::InternalServerError
    }
}

/// Load a car and check that `user` owns it
async fn owned_car(state: &AppState, id: Uuid, user: &AuthUser) -> ApiResult<Car> {
    let car = state
        .cars
        .find_by_id(id)
        .await
        .map_err(internal("Failed to load car"))?
        .ok_or(ApiError::NotFound(CAR_NOT_FOUND))?;

    if car.user_id != user.id {
        warn!("User {} tried to modify car {} owned by {}", user.id, id, car.user_id);
        return Err(ApiError::Forbidden(NOT_OWNER));
    }

    Ok(car)
}

/// Create a car from a multipart form
pub async fn create_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let form = read_car_form(multipart, state.config.max_images_per_car).await?;
    let (details, uploads) = form.into_details()?;

    let images = store_images(state.objects.as_ref(), uploads).await?;

    let new_car = NewCar {
        name: details.name,
        brand: details.brand,
        price: details.price,
        description: details.description,
        images,
        user_id: user.id,
    };

    let car = match state.cars.create(&new_car).await {
        Ok(car) => car,
        Err(e) => {
            discard_images(state.objects.as_ref(), &new_car.images).await;
            return Err(internal("Failed to create car")(e));
        }
    };

    info!("User {} created car {} with {} images", user.id, car.id, car.images.len());

    Ok((StatusCode::CREATED, Json(car)))
}

/// Every car
pub async fn list_cars(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let cars = state
        .cars
        .list()
        .await
        .map_err(internal("Failed to list cars"))?;

    Ok(Json(cars))
}

/// Cars owned by the caller
pub async fn list_my_cars(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let cars = state
        .cars
        .list_by_owner(user.id)
        .await
        .map_err(internal("Failed to list cars"))?;

    Ok(Json(cars))
}

/// One car by id
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_car_id(&id)?;

    let car = state
        .cars
        .find_by_id(id)
        .await
        .map_err(internal("Failed to load car"))?
        .ok_or(ApiError::NotFound(CAR_NOT_FOUND))?;

    Ok(Json(car))
}

/// Update a car. New images, when any are sent, replace the current ones.
pub async fn update_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_car_id(&id)?;
    owned_car(&state, id, &user).await?;

    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let form = read_car_form(multipart, state.config.max_images_per_car).await?;
    let (mut changes, uploads) = form.into_changes()?;

    let new_images = if uploads.is_empty() {
        Vec::new()
    } else {
        let stored = store_images(state.objects.as_ref(), uploads).await?;
        changes.images = Some(stored.clone());
        stored
    };

    let updated = match state.cars.update(id, &changes).await {
        Ok(updated) => updated,
        Err(e) => {
            discard_images(state.objects.as_ref(), &new_images).await;
            return Err(internal("Failed to update car")(e));
        }
    };

    let Some(car) = updated else {
        discard_images(state.objects.as_ref(), &new_images).await;
        return Err(ApiError::NotFound(CAR_NOT_FOUND));
    };

    info!("User {} updated car {}", user.id, car.id);

    Ok(Json(car))
}

/// Delete a car and its images
pub async fn delete_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_car_id(&id)?;
    owned_car(&state, id, &user).await?;

    state
        .cars
        .delete(id)
        .await
        .map_err(internal("Failed to delete car"))?
        .ok_or(ApiError::NotFound(CAR_NOT_FOUND))?;

    info!("User {} deleted car {}", user.id, id);

    Ok(Json(json!({ "message": "Car and its images deleted" })))
}
