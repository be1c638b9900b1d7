//! Middleware for JWT token validation and authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{error, warn};

use crate::{
    AuthState,
    error::{AuthError, NO_TOKEN, TOKEN_FAILED, USER_NOT_FOUND},
    models::PublicUser,
};

/// The user resolved from a valid bearer token, stored in request extensions
pub type AuthUser = PublicUser;

/// Require a valid bearer token and attach the resolved [`AuthUser`]
pub async fn auth_middleware(
    State(state): State<AuthState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        warn!("Rejected {} {}: no bearer token", req.method(), req.uri().path());
        return Err(AuthError::Unauthorized(NO_TOKEN));
    };

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Failed to validate token: {}", e);
            AuthError::Unauthorized(TOKEN_FAILED)
        })?;

    let user = state
        .users
        .find_by_id(claims.id)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.id, e);
            AuthError::InternalServerError
        })?
        .ok_or_else(|| {
            warn!("Token references unknown user {}", claims.id);
            AuthError::Unauthorized(USER_NOT_FOUND)
        })?;

    req.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(req).await)
}
