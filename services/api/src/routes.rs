//! API service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod cars;
pub mod images;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/cars", post(cars::create_car))
        .route("/api/cars/mine", get(cars::list_my_cars))
        .route("/api/cars/:id", put(cars::update_car).delete(cars::delete_car))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/cars", get(cars::list_cars))
        .route("/api/cars/:id", get(cars::get_car))
        .route("/api/cars/image/:filename", get(images::get_image))
        .route("/uploads/:filename", get(images::get_image))
        .merge(protected_routes)
        .nest("/api/users", auth::routes::create_router(state.auth.clone()))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => match common::database::health_check(pool).await {
            Ok(true) => "ok",
            _ => "unavailable",
        },
        None => "memory",
    };

    Json(json!({
        "status": "ok",
        "service": "car-listing",
        "database": database,
    }))
}
