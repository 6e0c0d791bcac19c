//! Whole-buffer LZ77 codec (C5): original length prefix, then the token
//! stream from [`crate::encode::encode`].

use crate::decode::decode;
use crate::encode::encode;
use comptk_core::codec::{Codec, CodecId};
use comptk_core::config::Lz77Params;
use comptk_core::error::{CompError, Result};

/// The LZ77 sliding-window codec.
#[derive(Debug, Clone, Copy)]
pub struct Lz77 {
    params: Lz77Params,
}

impl Lz77 {
    /// Build a codec using the given window/lookahead/min-match tuning.
    pub fn new(params: Lz77Params) -> Self {
        Self { params }
    }
}

impl Default for Lz77 {
    fn default() -> Self {
        Self::new(Lz77Params::DEFAULT)
    }
}

impl Codec for Lz77 {
    fn id(&self) -> CodecId {
        CodecId::Lz77
    }

    fn encode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = (input.len() as u64).to_le_bytes().to_vec();
        out.extend(encode(input, self.params));
        Ok(out)
    }

    fn decode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < 8 {
            return Err(CompError::truncated(0, 8 - input.len()));
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&input[..8]);
        let original_len = u64::from_le_bytes(len_bytes) as usize;
        decode(&input[8..], original_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_repeated_text() {
        let codec = Lz77::default();
        let input = b"ABABABABAB".to_vec();
        let encoded = codec.encode_buffer(&input).unwrap();
        let decoded = codec.decode_buffer(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn round_trips_empty_input() {
        let codec = Lz77::default();
        let encoded = codec.encode_buffer(&[]).unwrap();
        let decoded = codec.decode_buffer(&encoded).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn size_preset_compresses_at_least_as_well_as_speed_preset() {
        let input = b"the quick brown fox jumps over the lazy dog ".repeat(20);
        let size_codec = Lz77::new(Lz77Params::SIZE);
        let speed_codec = Lz77::new(Lz77Params::SPEED);
        let size_out = size_codec.encode_buffer(&input).unwrap();
        let speed_out = speed_codec.encode_buffer(&input).unwrap();
        assert!(size_out.len() <= speed_out.len());
    }
}
