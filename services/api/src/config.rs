//! Service configuration

use anyhow::Result;
use std::{env, str::FromStr};

/// Where records and images are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL tables
    Postgres,
    /// Process memory; nothing survives a restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown storage backend: {}", other),
        }
    }
}

/// HTTP service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// Maximum number of images attached to one car
    pub max_images_per_car: usize,
    /// Request body cap, covering all images of a request
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            storage_backend: StorageBackend::Postgres,
            max_images_per_car: 10,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `HOST`: Listen address (default: 0.0.0.0)
    /// - `PORT`: Listen port (default: 5000)
    /// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
    /// - `MAX_IMAGES_PER_CAR`: Image count limit (default: 10)
    /// - `MAX_UPLOAD_BYTES`: Request body limit (default: 50 MiB)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let max_images_per_car = env::var("MAX_IMAGES_PER_CAR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_images_per_car);

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        Ok(AppConfig {
            host,
            port,
            storage_backend,
            max_images_per_car,
            max_upload_bytes,
        })
    }

    /// `host:port` to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "HOST",
        "PORT",
        "STORAGE_BACKEND",
        "MAX_IMAGES_PER_CAR",
        "MAX_UPLOAD_BYTES",
    ];

    fn clear() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.max_images_per_car, 10);
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        clear();
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("STORAGE_BACKEND", "Memory");
            env::set_var("MAX_IMAGES_PER_CAR", "3");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.max_images_per_car, 3);
        clear();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_is_an_error() {
        clear();
        unsafe {
            env::set_var("STORAGE_BACKEND", "mongo");
        }
        assert!(AppConfig::from_env().is_err());
        clear();
    }
}
