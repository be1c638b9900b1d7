//! PostgreSQL bucket

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::{
    ByteStream, Download, ObjectStore, chunk,
    error::{StorageError, StorageResult},
    models::{NewObject, StoredObject},
};

/// Object store backed by the `upload_files` and `upload_chunks` tables
#[derive(Clone)]
pub struct PgBucket {
    pool: PgPool,
    chunk_size: usize,
}

impl PgBucket {
    /// Create a bucket using the default chunk size
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            chunk_size: chunk::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size used for new uploads
    pub fn with_chunk_size(mut self, chunk_size: usize) -> StorageResult<Self> {
        if chunk_size == 0 || chunk_size > i32::MAX as usize {
            return Err(StorageError::InvalidChunkSize(chunk_size));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }
}

#[async_trait]
impl ObjectStore for PgBucket {
    async fn upload(&self, object: NewObject) -> StorageResult<StoredObject> {
        let chunks = chunk::split(&object.data, self.chunk_size);
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, StoredObject>(
            r#"
            INSERT INTO upload_files (filename, content_type, length, chunk_size)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (filename) DO NOTHING
            RETURNING id, filename, content_type, length, chunk_size, upload_date
            "#,
        )
        .bind(&object.filename)
        .bind(&object.content_type)
        .bind(object.data.len() as i64)
        .bind(self.chunk_size as i32)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StorageError::AlreadyExists(object.filename.clone()))?;

        for (n, data) in chunks.iter().enumerate() {
            sqlx::query("INSERT INTO upload_chunks (files_id, n, data) VALUES ($1, $2, $3)")
                .bind(stored.id)
                .bind(n as i32)
                .bind(data.as_ref())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            "Stored {} ({} bytes in {} chunks)",
            stored.filename,
            stored.length,
            chunks.len()
        );
        Ok(stored)
    }

    async fn find(&self, filename: &str) -> StorageResult<Option<StoredObject>> {
        let stored = sqlx::query_as::<_, StoredObject>(
            r#"
            SELECT id, filename, content_type, length, chunk_size, upload_date
            FROM upload_files
            WHERE filename = $1
            "#,
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn open_download_stream(&self, filename: &str) -> StorageResult<Option<Download>> {
        let Some(info) = self.find(filename).await? else {
            return Ok(None);
        };

        let total = chunk::expected_chunks(info.length, info.chunk_size);
        let pool = self.pool.clone();
        let files_id = info.id;
        let name = info.filename.clone();

        let chunks = stream::try_unfold(0u32, move |n| {
            let pool = pool.clone();
            let name = name.clone();
            async move {
                if n >= total {
                    return Ok(None);
                }
                let data = fetch_chunk(&pool, files_id, n, &name).await?;
                Ok::<_, StorageError>(Some((data, n + 1)))
            }
        });

        let stream: ByteStream = Box::pin(chunks);
        Ok(Some(Download { info, stream }))
    }

    async fn delete(&self, filename: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM upload_files WHERE filename = $1")
            .bind(filename)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn fetch_chunk(pool: &PgPool, files_id: Uuid, n: u32, filename: &str) -> StorageResult<Bytes> {
    let data: Option<Vec<u8>> =
        sqlx::query_scalar("SELECT data FROM upload_chunks WHERE files_id = $1 AND n = $2")
            .bind(files_id)
            .bind(n as i32)
            .fetch_optional(pool)
            .await?;

    data.map(Bytes::from).ok_or_else(|| StorageError::MissingChunk {
        filename: filename.to_string(),
        n,
    })
}

/// Delete every object in `filenames` on an existing connection.
///
/// Lets callers remove objects inside their own transaction. Chunks go with
/// their file row through the foreign key cascade.
pub async fn delete_files(conn: &mut PgConnection, filenames: &[String]) -> Result<u64, sqlx::Error> {
    if filenames.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM upload_files WHERE filename = ANY($1)")
        .bind(filenames)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}
