//! Stored object models

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata of a stored object
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoredObject {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    /// Total payload length in bytes
    pub length: i64,
    pub chunk_size: i32,
    pub upload_date: DateTime<Utc>,
}

/// Object upload payload
#[derive(Debug, Clone)]
pub struct NewObject {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}
