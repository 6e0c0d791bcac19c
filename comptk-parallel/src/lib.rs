//! Parallel chunked compression driver (C8).
//!
//! Partitions an input into `N` roughly equal chunks, compresses each
//! independently with `rayon`'s work-stealing pool ("heavy work in
//! parallel, final assembly sequential"), and reassembles a deterministic,
//! order-preserving output with an explicit chunk index. Workers share no
//! mutable state; a worker error aborts the operation with the first
//! reported error, in-flight workers are allowed to finish but their
//! output is discarded.

#![warn(missing_docs)]
#![warn(clippy::all)]

use comptk_core::codec::Codec;
use comptk_core::error::{CompError, Result};
use rayon::prelude::*;

/// Smallest chunk the partitioner will ever produce; keeps chunk count
/// from exploding on tiny inputs with a large configured thread count.
pub const MIN_CHUNK: usize = 1024;

/// Decide how many chunks to split `input_len` bytes into, given a
/// configured thread count (0 chunks only for a genuinely empty input).
fn chunk_count(input_len: usize, thread_count: usize) -> usize {
    if input_len == 0 {
        return 1;
    }
    let by_size = input_len.div_ceil(MIN_CHUNK);
    thread_count.max(1).min(by_size).max(1)
}

/// Split `input` into `n` chunks of as-equal-as-possible size; the last
/// chunk absorbs the remainder.
fn partition(input: &[u8], n: usize) -> Vec<&[u8]> {
    if input.is_empty() {
        return vec![&input[0..0]];
    }
    let base = input.len() / n;
    let remainder = input.len() % n;
    let mut chunks = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < remainder);
        chunks.push(&input[start..start + size]);
        start += size;
    }
    chunks
}

/// Compress `input` through `codec`, `thread_count` chunks at a time, and
/// return the wrapped parallel-container bytes.
pub fn compress(codec: &(dyn Codec + Sync), input: &[u8], thread_count: usize) -> Result<Vec<u8>> {
    let n = chunk_count(input.len(), thread_count);
    let chunks = partition(input, n);

    let encoded: Vec<Result<Vec<u8>>> = chunks
        .par_iter()
        .map(|chunk| codec.encode_buffer(chunk))
        .collect();

    let mut bodies = Vec::with_capacity(encoded.len());
    for result in encoded {
        bodies.push(result?);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(chunks.len() as u32).to_le_bytes());

    let mut offset = 0u64;
    for (chunk, body) in chunks.iter().zip(bodies.iter()) {
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&(chunk.len() as u64).to_le_bytes());
        out.extend_from_slice(&(body.len() as i64).to_le_bytes());
        out.extend_from_slice(body);
        offset += chunk.len() as u64;
    }
    Ok(out)
}

struct ChunkRecord<'a> {
    original_size: usize,
    body: &'a [u8],
}

fn read_records(input: &[u8]) -> Result<Vec<ChunkRecord<'_>>> {
    if input.len() < 4 {
        return Err(CompError::truncated(0, 4 - input.len()));
    }
    let chunk_count = u32::from_le_bytes(input[..4].try_into().unwrap()) as usize;

    let mut records = Vec::with_capacity(chunk_count);
    let mut pos = 4usize;
    for _ in 0..chunk_count {
        let header = input
            .get(pos..pos + 24)
            .ok_or_else(|| CompError::truncated(pos as u64, 24))?;
        let _original_offset = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let original_size = u64::from_le_bytes(header[8..16].try_into().unwrap()) as usize;
        let compressed_size = i64::from_le_bytes(header[16..24].try_into().unwrap());
        if compressed_size < 0 {
            return Err(CompError::corrupt_stream(
                "parallel chunk record has a negative compressed size",
            ));
        }
        let compressed_size = compressed_size as usize;
        pos += 24;
        let body = input
            .get(pos..pos + compressed_size)
            .ok_or_else(|| CompError::truncated(pos as u64, compressed_size))?;
        pos += compressed_size;
        records.push(ChunkRecord {
            original_size,
            body,
        });
    }
    Ok(records)
}

/// Decode a parallel container produced by [`compress`], dispatching each
/// chunk's decompression across `codec` in parallel and concatenating
/// results in original order.
pub fn decompress(codec: &(dyn Codec + Sync), input: &[u8]) -> Result<Vec<u8>> {
    let records = read_records(input)?;

    let decoded: Vec<Result<Vec<u8>>> = records
        .par_iter()
        .map(|record| {
            let bytes = codec.decode_buffer(record.body)?;
            if bytes.len() != record.original_size {
                return Err(CompError::corrupt_stream(format!(
                    "parallel chunk decoded to {} bytes, header declared {}",
                    bytes.len(),
                    record.original_size
                )));
            }
            Ok(bytes)
        })
        .collect();

    let mut out = Vec::new();
    for result in decoded {
        out.extend(result?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptk_core::codec::CodecId;

    #[derive(Debug, Clone, Copy)]
    struct Identity;
    impl Codec for Identity {
        fn id(&self) -> CodecId {
            CodecId::Rle
        }
        fn encode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
            Ok(input.to_vec())
        }
        fn decode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
            Ok(input.to_vec())
        }
    }

    #[test]
    fn single_chunk_degrades_to_uniform_wrapped_format() {
        let input = b"small".to_vec();
        let wrapped = compress(&Identity, &input, 8).unwrap();
        let count = u32::from_le_bytes(wrapped[..4].try_into().unwrap());
        assert_eq!(count, 1);
        let decoded = decompress(&Identity, &wrapped).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn multi_chunk_round_trips_in_order() {
        let input: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let wrapped = compress(&Identity, &input, 4).unwrap();
        let count = u32::from_le_bytes(wrapped[..4].try_into().unwrap());
        assert!(count > 1);
        let decoded = decompress(&Identity, &wrapped).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn chunk_count_never_exceeds_thread_count() {
        let input = vec![0u8; 100_000];
        assert_eq!(chunk_count(input.len(), 3), 3);
        assert!(chunk_count(input.len(), 64) <= 100_000 / MIN_CHUNK + 1);
    }

    #[test]
    fn empty_input_round_trips() {
        let wrapped = compress(&Identity, &[], 4).unwrap();
        let decoded = decompress(&Identity, &wrapped).unwrap();
        assert!(decoded.is_empty());
    }
}
