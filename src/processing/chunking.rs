//! Fixed-size chunking of serialized document text.
//!
//! Chunk boundaries are purely positional. A boundary may fall in the middle of a JSON token;
//! each chunk is summarized independently, so the occasional split token costs a little
//! summary quality in exchange for a predictable request budget.

use thiserror::Error;

/// Errors produced while slicing a document into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Caller configured an impossible chunk size.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Split text into an ordered sequence of chunks of at most `chunk_size` characters.
///
/// Concatenating the chunks in order reproduces the input exactly. Every chunk except
/// possibly the last contains exactly `chunk_size` characters. Empty input yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::new();
    let mut current = String::with_capacity(chunk_size);
    let mut filled = 0;

    for ch in text.chars() {
        current.push(ch);
        filled += 1;
        if filled == chunk_size {
            chunks.push(std::mem::take(&mut current));
            filled = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}
