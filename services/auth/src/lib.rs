//! Authentication for the car listing service
//!
//! Registration and login endpoints, Argon2 password hashing, HS256 bearer
//! tokens and the middleware that guards protected routes.

use std::sync::Arc;

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod validation;

use crate::{jwt::JwtService, rate_limiter::RateLimiter, repositories::UserStore};

/// State shared by the user routes and the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserStore>,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
}

impl AuthState {
    pub fn new(users: Arc<dyn UserStore>, jwt_service: JwtService, rate_limiter: RateLimiter) -> Self {
        Self {
            users,
            jwt_service,
            rate_limiter,
        }
    }
}
