//! Splitting object payloads into fixed-size chunks

use bytes::Bytes;

/// Default chunk size, 255 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Split `data` into consecutive chunks of at most `chunk_size` bytes.
///
/// The returned slices share the buffer of `data`. An empty payload yields
/// no chunks.
pub fn split(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    assert!(chunk_size > 0, "chunk size must be positive");

    let mut chunks = Vec::with_capacity(data.len().div_ceil(chunk_size));
    let mut start = 0;
    while start < data.len() {
        let end = (start + chunk_size).min(data.len());
        chunks.push(data.slice(start..end));
        start = end;
    }
    chunks
}

/// Number of chunks an object of `length` bytes is stored in
pub fn expected_chunks(length: i64, chunk_size: i32) -> u32 {
    if length <= 0 || chunk_size <= 0 {
        return 0;
    }
    let length = length as u64;
    let chunk_size = chunk_size as u64;
    length.div_ceil(chunk_size) as u32
}
