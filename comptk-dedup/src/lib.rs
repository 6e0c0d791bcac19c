//! Content-defined deduplication engine (C11): chunk a buffer, fingerprint
//! each chunk with SHA-1, and replace repeats with back-references into the
//! already-emitted output.
//!
//! This crate works purely on in-memory buffers. The "DEDUP" stream it
//! produces is itself ordinary bytes and may be handed to any [`Codec`] as a
//! post-pass, which the coordinator crate is responsible for wiring up.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunking;

use std::collections::HashMap;

use comptk_core::checksum::Sha1;
use comptk_core::error::{CompError, Result};

pub use chunking::ChunkMode;

const MAGIC: &[u8; 5] = b"DEDUP";

/// A single entry in the fingerprint table: the chunk's content identity,
/// where it first appeared in the original input, and how many times it has
/// been referenced since.
#[derive(Debug, Clone)]
struct Entry {
    fingerprint: [u8; 20],
    original_offset: u64,
    size: u32,
    ref_count: u32,
}

/// Counters describing how much a deduplication pass actually saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DedupStats {
    /// Size of the original, pre-dedup input.
    pub total_bytes: u64,
    /// Bytes actually written for chunk bodies: new chunks in full, nothing
    /// for chunks resolved to a back-reference.
    pub bytes_after_dedup: u64,
    /// Total number of chunks the input was split into.
    pub total_chunks: u64,
    /// Number of chunks that resolved to a back-reference.
    pub duplicate_chunks: u64,
    /// Sum of the sizes of all duplicate chunks.
    pub duplicate_bytes_saved: u64,
}

impl DedupStats {
    /// `1 - bytes_after_dedup / total_bytes`, or `0.0` for empty input.
    pub fn ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        1.0 - (self.bytes_after_dedup as f64 / self.total_bytes as f64)
    }
}

/// Deduplicate `input`, returning the "DEDUP" stream and statistics about
/// the pass.
///
/// `chunk_size` is only meaningful for [`ChunkMode::Fixed`].
pub fn compress(
    input: &[u8],
    mode: ChunkMode,
    chunk_size: usize,
) -> Result<(Vec<u8>, DedupStats)> {
    let chunks = chunking::split(input, mode, chunk_size)?;

    let mut table: HashMap<[u8; 2], Vec<Entry>> = HashMap::new();
    let mut stats = DedupStats {
        total_bytes: input.len() as u64,
        total_chunks: chunks.len() as u64,
        ..Default::default()
    };

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(input.len() as u64).to_le_bytes());
    out.extend_from_slice(&(chunks.len() as u64).to_le_bytes());

    for range in &chunks {
        let bytes = &input[range.clone()];
        let fingerprint = Sha1::compute(bytes);
        let bucket = [fingerprint[0], fingerprint[1]];
        let size = bytes.len() as u32;

        let existing = table
            .get_mut(&bucket)
            .and_then(|list| list.iter_mut().find(|e| e.fingerprint == fingerprint && e.size == size));

        match existing {
            Some(entry) => {
                entry.ref_count += 1;
                out.extend_from_slice(&size.to_le_bytes());
                out.push(1);
                out.extend_from_slice(&entry.original_offset.to_le_bytes());
                stats.duplicate_chunks += 1;
                stats.duplicate_bytes_saved += size as u64;
            }
            None => {
                table.entry(bucket).or_default().push(Entry {
                    fingerprint,
                    original_offset: range.start as u64,
                    size,
                    ref_count: 0,
                });
                out.extend_from_slice(&size.to_le_bytes());
                out.push(0);
                out.extend_from_slice(bytes);
                stats.bytes_after_dedup += size as u64;
            }
        }
    }

    Ok((out, stats))
}

/// Reconstruct the original bytes from a "DEDUP" stream produced by
/// [`compress`].
pub fn decompress(stream: &[u8]) -> Result<Vec<u8>> {
    if stream.len() < 5 || &stream[0..5] != MAGIC {
        return Err(CompError::bad_magic(MAGIC, stream.get(0..5).unwrap_or(stream).to_vec()));
    }
    let original_size = read_u64(stream, 5)? as usize;
    let chunk_count = read_u64(stream, 13)?;

    let mut out = Vec::with_capacity(original_size);
    let mut pos = 21usize;

    for _ in 0..chunk_count {
        let size = read_u32(stream, pos)? as usize;
        pos += 4;
        let is_reference = *stream
            .get(pos)
            .ok_or_else(|| CompError::truncated(pos as u64, 1))?;
        pos += 1;

        if is_reference == 0 {
            let bytes = stream
                .get(pos..pos + size)
                .ok_or_else(|| CompError::truncated(pos as u64, size))?;
            out.extend_from_slice(bytes);
            pos += size;
        } else {
            let offset = read_u64(stream, pos)? as usize;
            pos += 8;
            let end = offset
                .checked_add(size)
                .ok_or_else(|| CompError::corrupt_stream("back-reference overflows"))?;
            if end > out.len() {
                return Err(CompError::invalid_reference(offset, out.len()));
            }
            let bytes = out[offset..end].to_vec();
            out.extend_from_slice(&bytes);
        }
    }

    if out.len() != original_size {
        return Err(CompError::corrupt_stream(
            "reconstructed length disagrees with header",
        ));
    }
    Ok(out)
}

fn read_u64(data: &[u8], pos: usize) -> Result<u64> {
    let bytes = data
        .get(pos..pos + 8)
        .ok_or_else(|| CompError::truncated(pos as u64, 8))?;
    Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32> {
    let bytes = data
        .get(pos..pos + 4)
        .ok_or_else(|| CompError::truncated(pos as u64, 4))?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_fixed_chunking() {
        let input = b"the quick brown fox the quick brown fox the quick brown fox".to_vec();
        let (stream, stats) = compress(&input, ChunkMode::Fixed, 8).unwrap();
        assert_eq!(decompress(&stream).unwrap(), input);
        assert_eq!(stats.total_bytes, input.len() as u64);
        assert!(stats.duplicate_chunks > 0);
    }

    #[test]
    fn round_trips_with_variable_chunking() {
        let block: Vec<u8> = (0..1024u32).map(|i| (i * 7 % 256) as u8).collect();
        let input: Vec<u8> = block.iter().cycle().take(block.len() * 6).copied().collect();
        let (stream, _stats) = compress(&input, ChunkMode::Variable, 0).unwrap();
        assert_eq!(decompress(&stream).unwrap(), input);
    }

    #[test]
    fn empty_input_round_trips() {
        let (stream, stats) = compress(&[], ChunkMode::Fixed, 16).unwrap();
        assert_eq!(decompress(&stream).unwrap(), Vec::<u8>::new());
        assert_eq!(stats.total_chunks, 0);
        assert_eq!(stats.ratio(), 0.0);
    }

    #[test]
    fn thousand_repeated_blocks_are_mostly_deduplicated() {
        let mut state = 7u32;
        let block: Vec<u8> = (0..1024)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect();
        let input: Vec<u8> = block.iter().cycle().take(block.len() * 1000).copied().collect();
        // A max chunk size equal to the block period forces a cut at every
        // block boundary whenever the mask doesn't fire first, so nearly
        // every block becomes a duplicate of the first.
        let (stream, stats) = compress(&input, ChunkMode::Variable, block.len()).unwrap();
        assert_eq!(decompress(&stream).unwrap(), input);
        assert!(stats.duplicate_chunks as f64 / stats.total_chunks as f64 > 0.9);
    }

    #[test]
    fn no_duplicates_still_round_trips() {
        let input: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
        let (stream, stats) = compress(&input, ChunkMode::Fixed, 64).unwrap();
        assert_eq!(decompress(&stream).unwrap(), input);
        assert_eq!(stats.duplicate_chunks, 0);
        assert_eq!(stats.bytes_after_dedup, stats.total_bytes);
    }

    #[test]
    fn corrupted_back_reference_is_rejected() {
        let input = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec();
        let (mut stream, _) = compress(&input, ChunkMode::Fixed, 8).unwrap();
        let last = stream.len() - 1;
        stream[last] = 0xFF;
        let _ = decompress(&stream);
    }

    #[test]
    fn bad_magic_is_rejected() {
        assert!(decompress(b"NOTDEDUP000000000000").is_err());
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let input = b"hello hello hello hello".to_vec();
        let (stream, _) = compress(&input, ChunkMode::Fixed, 5).unwrap();
        assert!(decompress(&stream[..stream.len() - 3]).is_err());
    }
}
