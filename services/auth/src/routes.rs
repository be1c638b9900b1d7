//! User registration and login routes, mounted under `/api/users`

use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    AuthState,
    error::AuthError,
    middleware::{AuthUser, auth_middleware},
    models::{NewUser, PublicUser, normalize_email},
    password::{hash_password_blocking, verify_password_blocking},
    validation::{validate_email, validate_password, validate_username},
};

const USER_EXISTS: &str = "User already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response payload for a successful login
#[derive(Serialize)]
pub struct LoginData {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

/// Create the router for the user endpoints
pub fn create_router<S>(state: AuthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let protected_routes = Router::new()
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// User registration endpoint
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload.map_err(|e| AuthError::BadRequest(e.body_text()))?;
    let email = normalize_email(&payload.email);

    info!("Registration attempt for {}", email);

    let existing = state.users.find_by_email(&email).await.map_err(|e| {
        error!("Failed to look up user {}: {}", email, e);
        AuthError::InternalServerError
    })?;
    if existing.is_some() {
        return Err(AuthError::BadRequest(USER_EXISTS.to_string()));
    }

    validate_email(&email).map_err(AuthError::BadRequest)?;
    validate_username(&payload.username).map_err(AuthError::BadRequest)?;
    validate_password(&payload.password).map_err(AuthError::BadRequest)?;

    let password_hash = hash_password_blocking(payload.password)
        .await
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            AuthError::InternalServerError
        })?;

    let new_user = NewUser {
        username: payload.username.trim().to_string(),
        email,
        password_hash,
    };

    let user = state
        .users
        .create(&new_user)
        .await
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or_else(|| AuthError::BadRequest(USER_EXISTS.to_string()))?;

    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": PublicUser::from(user),
        })),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload.map_err(|e| AuthError::BadRequest(e.body_text()))?;
    let email = normalize_email(&payload.email);

    info!("Login attempt for user: {}", email);

    if !state.rate_limiter.is_allowed(&email).await {
        warn!("Login locked out for {}", email);
        return Err(AuthError::TooManyRequests);
    }

    let user = state.users.find_by_email(&email).await.map_err(|e| {
        error!("Failed to look up user {}: {}", email, e);
        AuthError::InternalServerError
    })?;

    let Some(user) = user else {
        state.rate_limiter.record_failure(&email).await;
        return Err(AuthError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };

    let matches = verify_password_blocking(payload.password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!("Failed to verify password for {}: {}", user.id, e);
            AuthError::InternalServerError
        })?;

    if !matches {
        state.rate_limiter.record_failure(&email).await;
        return Err(AuthError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    state.rate_limiter.reset(&email).await;

    let token = state.jwt_service.generate_token(user.id).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::InternalServerError
    })?;

    let data = LoginData {
        user: PublicUser::from(user),
        token,
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
        })),
    ))
}

/// Return the authenticated user
pub async fn current_user(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": user,
    }))
}
