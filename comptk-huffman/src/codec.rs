//! Whole-buffer canonical Huffman codec (C3).
//!
//! Layout: original length (`u64`), the pre-order tree, then the bit
//! stream, zero-padded to a byte boundary.

use crate::tree::Tree;
use comptk_core::bitstream::{BitReader, BitWriter};
use comptk_core::codec::{Codec, CodecId};
use comptk_core::config::huffman_max_depth;
use comptk_core::error::{CompError, Result};
use std::io::Cursor;

/// Canonical Huffman codec bound to a single optimization goal's depth cap.
#[derive(Debug, Clone, Copy)]
pub struct Huffman {
    max_depth: u32,
}

impl Huffman {
    /// Build a codec that length-limits its trees to `max_depth`.
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// Build a codec using the default depth cap for `goal`.
    pub fn for_goal(goal: comptk_core::config::OptimizationGoal) -> Self {
        Self::new(huffman_max_depth(goal))
    }
}

impl Default for Huffman {
    fn default() -> Self {
        Self::new(256)
    }
}

fn frequency_table(input: &[u8]) -> [u64; 256] {
    let mut freqs = [0u64; 256];
    for &b in input {
        freqs[b as usize] += 1;
    }
    freqs
}

impl Codec for Huffman {
    fn id(&self) -> CodecId {
        CodecId::Huffman
    }

    fn encode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = (input.len() as u64).to_le_bytes().to_vec();

        let Some((tree, table)) = Tree::build(&frequency_table(input), self.max_depth) else {
            // Empty input: length prefix alone decodes to nothing.
            return Ok(out);
        };

        let mut body = Vec::new();
        {
            let mut writer = BitWriter::new(&mut body);
            tree.write_to(&mut writer)?;
            for &byte in input {
                let code = table
                    .get(byte)
                    .expect("every input byte has a frequency-table entry");
                writer.write_bits(code.bits, code.length)?;
            }
            writer.flush()?;
        }
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn decode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < 8 {
            return Err(CompError::truncated(0, 8 - input.len()));
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&input[..8]);
        let original_len = u64::from_le_bytes(len_bytes) as usize;

        if original_len == 0 {
            return Ok(Vec::new());
        }

        let mut reader = BitReader::new(Cursor::new(&input[8..]));
        let tree = Tree::read_from(&mut reader)?;

        let mut output = Vec::with_capacity(original_len);
        let mut pos = None;
        while output.len() < original_len {
            let (next_pos, emitted) = tree.step(&mut reader, pos)?;
            pos = Some(next_pos);
            if let Some(byte) = emitted {
                output.push(byte);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_text() {
        let codec = Huffman::default();
        let input = b"the quick brown fox jumps over the lazy dog, repeatedly".repeat(4);
        let encoded = codec.encode_buffer(&input).unwrap();
        let decoded = codec.decode_buffer(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn round_trips_empty_input() {
        let codec = Huffman::default();
        let encoded = codec.encode_buffer(&[]).unwrap();
        assert_eq!(encoded.len(), 8);
        let decoded = codec.decode_buffer(&encoded).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn round_trips_single_repeated_byte() {
        let codec = Huffman::default();
        let input = vec![7u8; 1000];
        let encoded = codec.encode_buffer(&input).unwrap();
        let decoded = codec.decode_buffer(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn compresses_skewed_distribution() {
        let codec = Huffman::default();
        let mut input = vec![b'a'; 900];
        input.extend(vec![b'b'; 90]);
        input.extend(vec![b'c'; 10]);
        let encoded = codec.encode_buffer(&input).unwrap();
        assert!(encoded.len() < input.len());
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let codec = Huffman::default();
        assert!(codec.decode_buffer(&[1, 2, 3]).is_err());
    }

    #[test]
    fn depth_capped_codec_still_round_trips() {
        let codec = Huffman::new(6);
        let mut input = Vec::new();
        for s in 0u8..50 {
            input.extend(std::iter::repeat_n(s, (s as usize) + 1));
        }
        let encoded = codec.encode_buffer(&input).unwrap();
        let decoded = codec.decode_buffer(&encoded).unwrap();
        assert_eq!(decoded, input);
    }
}
