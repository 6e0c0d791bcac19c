//! Run-length encoding codec (C4).
//!
//! Intentionally simple: no match search, no entropy stage. Near-optimal
//! only for highly repetitive content, but its output is trivial to verify
//! and it makes a cheap inner codec for the parallel driver and container
//! tests.
//!
//! Layout: original length (`u64`), then `(count, byte)` pairs with
//! `count` in `1..=255`; a run of 256 or more repeats of the same byte is
//! split into multiple pairs.

#![warn(missing_docs)]
#![warn(clippy::all)]

use comptk_core::codec::{Codec, CodecId};
use comptk_core::error::{CompError, Result};

const MAX_RUN: usize = 255;

/// The run-length encoding codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rle;

impl Codec for Rle {
    fn id(&self) -> CodecId {
        CodecId::Rle
    }

    fn encode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = (input.len() as u64).to_le_bytes().to_vec();

        let mut i = 0;
        while i < input.len() {
            let byte = input[i];
            let mut run = 1usize;
            while i + run < input.len() && input[i + run] == byte && run < MAX_RUN {
                run += 1;
            }
            out.push(run as u8);
            out.push(byte);
            i += run;
        }
        Ok(out)
    }

    fn decode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < 8 {
            return Err(CompError::truncated(0, 8 - input.len()));
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&input[..8]);
        let original_len = u64::from_le_bytes(len_bytes) as usize;

        let mut out = Vec::with_capacity(original_len);
        let mut pairs = input[8..].chunks_exact(2);
        for pair in &mut pairs {
            let count = pair[0] as usize;
            let byte = pair[1];
            if out.len() + count > original_len {
                return Err(CompError::corrupt_stream(format!(
                    "rle run would overshoot declared length {original_len}"
                )));
            }
            out.resize(out.len() + count, byte);
        }
        if !pairs.remainder().is_empty() {
            return Err(CompError::corrupt_stream(
                "rle stream ends mid-pair",
            ));
        }
        if out.len() != original_len {
            return Err(CompError::truncated(0, original_len - out.len()));
        }
        Ok(out)
    }
}
