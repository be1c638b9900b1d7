//! Chunked object store for uploaded images
//!
//! Objects are addressed by filename. Each object is a metadata record plus
//! an ordered sequence of fixed-size chunks, and is read back as a stream of
//! those chunks so large files never have to be buffered whole.
//!
//! Two backends implement [`ObjectStore`]:
//!
//! - [`PgBucket`] keeps metadata in `upload_files` and chunks in
//!   `upload_chunks`
//! - [`MemoryBucket`] keeps everything in process memory

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

pub mod chunk;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryBucket;
pub use models::{NewObject, StoredObject};
pub use postgres::PgBucket;

/// Stream of an object's chunks, in order
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// An opened object: its metadata and the stream of its content
pub struct Download {
    pub info: StoredObject,
    pub stream: ByteStream,
}

/// Data-access trait for named binary objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a new object. Fails with [`StorageError::AlreadyExists`] when the
    /// filename is taken.
    async fn upload(&self, object: NewObject) -> StorageResult<StoredObject>;

    /// Look up an object's metadata by filename
    async fn find(&self, filename: &str) -> StorageResult<Option<StoredObject>>;

    /// Open an object for streaming, `None` when absent
    async fn open_download_stream(&self, filename: &str) -> StorageResult<Option<Download>>;

    /// Remove an object and its chunks. Returns whether anything was removed.
    async fn delete(&self, filename: &str) -> StorageResult<bool>;
}
