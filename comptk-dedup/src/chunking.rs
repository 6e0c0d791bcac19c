//! Chunk boundary selection for the deduplication engine.

use comptk_core::error::{CompError, Result};

/// Content-defined chunking window, in bytes.
const CDC_WINDOW: usize = 48;
/// Rabin-Karp prime used by the rolling hash.
const CDC_PRIME: u64 = 31;
/// Smallest chunk the CDC scan will ever declare, regardless of where the
/// rolling hash first satisfies the boundary mask.
const MIN_CHUNK_SIZE: usize = 64;
/// A boundary is declared where these low bits of the rolling hash are zero.
const BOUNDARY_MASK: u64 = 0xFFFF;

/// How input bytes are split into chunks before fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    /// Every chunk is exactly `chunk_size` bytes, except possibly the last.
    Fixed,
    /// Content-defined chunking via the rolling hash described below.
    Variable,
    /// Reserved for content-type-aware refinement; behaves like `Variable`.
    Smart,
}

/// A half-open byte range `[start, end)` into the original input.
pub type Chunk = std::ops::Range<usize>;

/// Split `data` into chunks according to `mode`.
///
/// `chunk_size` is the exact chunk length for [`ChunkMode::Fixed`]. For the
/// content-defined modes it instead bounds the maximum chunk length: if no
/// natural boundary is found before `chunk_size` bytes have been scanned,
/// the chunk is force-cut there. Pass `0` for an uncapped content-defined
/// scan (boundaries then occur only at the rolling-hash mask or end of
/// input).
pub fn split(data: &[u8], mode: ChunkMode, chunk_size: usize) -> Result<Vec<Chunk>> {
    match mode {
        ChunkMode::Fixed => split_fixed(data, chunk_size),
        ChunkMode::Variable | ChunkMode::Smart => Ok(split_variable(data, chunk_size)),
    }
}

fn split_fixed(data: &[u8], chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(CompError::invalid_argument("chunk_size must be nonzero"));
    }
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut chunks = Vec::with_capacity(data.len().div_ceil(chunk_size));
    let mut start = 0;
    while start < data.len() {
        let end = (start + chunk_size).min(data.len());
        chunks.push(start..end);
        start = end;
    }
    Ok(chunks)
}

fn split_variable(data: &[u8], max_chunk_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < data.len() {
        let end = next_variable_boundary(data, start, max_chunk_size);
        chunks.push(start..end);
        start = end;
    }
    chunks
}

/// Scan forward from `start`, returning the exclusive end of the next
/// content-defined chunk. Always advances by at least [`MIN_CHUNK_SIZE`]
/// bytes (or to the end of `data`). Never returns past
/// `start + max_chunk_size` when that cap is nonzero and larger than the
/// minimum.
fn next_variable_boundary(data: &[u8], start: usize, max_chunk_size: usize) -> usize {
    let len = data.len();
    let cap = if max_chunk_size > MIN_CHUNK_SIZE {
        (start + max_chunk_size).min(len)
    } else {
        len
    };
    let first_candidate = start + MIN_CHUNK_SIZE;
    if first_candidate + CDC_WINDOW >= cap {
        return cap;
    }

    let p_pow_w = pow_wrapping(CDC_PRIME, CDC_WINDOW as u32);
    let mut i = first_candidate;
    let mut hash = window_hash(&data[i - CDC_WINDOW..i]);

    loop {
        if hash & BOUNDARY_MASK == 0 {
            return i;
        }
        if i + 1 >= cap {
            return cap;
        }
        let outgoing = data[i - CDC_WINDOW] as u64;
        let incoming = data[i + 1] as u64;
        hash = CDC_PRIME
            .wrapping_mul(hash.wrapping_sub(outgoing.wrapping_mul(p_pow_w)))
            .wrapping_add(incoming);
        i += 1;
    }
}

fn window_hash(window: &[u8]) -> u64 {
    let mut hash = 0u64;
    for &byte in window {
        hash = hash.wrapping_mul(CDC_PRIME).wrapping_add(byte as u64);
    }
    hash
}

fn pow_wrapping(base: u64, exp: u32) -> u64 {
    let mut result = 1u64;
    for _ in 0..exp {
        result = result.wrapping_mul(base);
    }
    result
}
