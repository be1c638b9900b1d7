//! Error type for authentication failures

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const NO_TOKEN: &str = "Not authorized, no token";
pub const TOKEN_FAILED: &str = "Not authorized, token failed";
pub const USER_NOT_FOUND: &str = "Not authorized, user not found";

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid input, duplicate registration or bad credentials
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or orphaned bearer token
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Login locked out by the rate limiter
    #[error("Too many login attempts, try again later")]
    TooManyRequests,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}
