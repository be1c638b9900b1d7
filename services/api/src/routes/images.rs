//! Image download endpoint

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Stream a stored image by filename
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let download = state
        .objects
        .open_download_stream(&filename)
        .await?
        .filter(|download| download.info.length > 0)
        .ok_or(ApiError::NotFound("File not found"))?;

    debug!(
        "Streaming {} ({} bytes in {}-byte chunks)",
        filename, download.info.length, download.info.chunk_size
    );

    let headers = [
        (header::CONTENT_TYPE, download.info.content_type.clone()),
        (header::CONTENT_LENGTH, download.info.length.to_string()),
    ];

    Ok((headers, Body::from_stream(download.stream)))
}
