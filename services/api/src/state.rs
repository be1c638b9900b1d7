//! Application state shared across handlers

use auth::{
    AuthState,
    jwt::JwtService,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{MemoryUserStore, UserRepository},
};
use sqlx::PgPool;
use std::sync::Arc;
use storage::{MemoryBucket, ObjectStore, PgBucket};

use crate::{
    config::AppConfig,
    repositories::{CarRepository, CarStore, MemoryCarStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Present when running on PostgreSQL
    pub db_pool: Option<PgPool>,
    pub auth: AuthState,
    pub cars: Arc<dyn CarStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub config: AppConfig,
}

impl AppState {
    /// State backed by PostgreSQL for users, cars and images
    pub fn with_postgres(pool: PgPool, jwt_service: JwtService, config: AppConfig) -> Self {
        let auth = AuthState::new(
            Arc::new(UserRepository::new(pool.clone())),
            jwt_service,
            RateLimiter::new(RateLimiterConfig::default()),
        );

        Self {
            auth,
            cars: Arc::new(CarRepository::new(pool.clone())),
            objects: Arc::new(PgBucket::new(pool.clone())),
            db_pool: Some(pool),
            config,
        }
    }

    /// State kept entirely in process memory
    pub fn in_memory(jwt_service: JwtService, config: AppConfig) -> Self {
        let bucket = MemoryBucket::new();
        let auth = AuthState::new(
            Arc::new(MemoryUserStore::new()),
            jwt_service,
            RateLimiter::new(RateLimiterConfig::default()),
        );

        Self {
            db_pool: None,
            auth,
            cars: Arc::new(MemoryCarStore::new(bucket.clone())),
            objects: Arc::new(bucket),
            config,
        }
    }
}
