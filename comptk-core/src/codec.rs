//! Codec identity and the buffer-to-buffer [`Codec`] trait (C7 support).
//!
//! The source dispatches codecs through a struct of function pointers.
//! Per Design Notes §9 this becomes a small enumerated id plus a trait with
//! `encode_buffer`/`decode_buffer`; codecs never open files themselves, they
//! are driven by the containers or the coordinator.

use crate::error::Result;

/// Enumerated codec identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// Canonical Huffman coding.
    Huffman,
    /// Run-length encoding.
    Rle,
    /// LZ77 sliding-window coding.
    Lz77,
    /// LZ77 output XOR'd against a repeating key.
    ObfuscatedLz77,
    /// Huffman, parallel-driver wrapped.
    HuffmanParallel,
    /// RLE, parallel-driver wrapped.
    RleParallel,
    /// LZ77, parallel-driver wrapped.
    Lz77Parallel,
    /// Progressive block container.
    Progressive,
}

impl CodecId {
    /// The single byte this id is written as in container headers.
    pub fn to_u8(self) -> u8 {
        match self {
            CodecId::Huffman => 0,
            CodecId::Rle => 1,
            CodecId::Lz77 => 2,
            CodecId::ObfuscatedLz77 => 3,
            CodecId::HuffmanParallel => 4,
            CodecId::RleParallel => 5,
            CodecId::Lz77Parallel => 6,
            CodecId::Progressive => 7,
        }
    }

    /// Reconstruct a [`CodecId`] from a header byte.
    pub fn from_u8(byte: u8) -> Result<Self> {
        Ok(match byte {
            0 => CodecId::Huffman,
            1 => CodecId::Rle,
            2 => CodecId::Lz77,
            3 => CodecId::ObfuscatedLz77,
            4 => CodecId::HuffmanParallel,
            5 => CodecId::RleParallel,
            6 => CodecId::Lz77Parallel,
            7 => CodecId::Progressive,
            other => {
                return Err(crate::error::CompError::unsupported(format!(
                    "unknown codec id byte {other}"
                )));
            }
        })
    }
}

/// A buffer-to-buffer transform: the shape every codec in this workspace
/// implements. Containers and the coordinator call these; codecs never
/// touch a file handle.
pub trait Codec {
    /// This codec's identifier.
    fn id(&self) -> CodecId;

    /// Compress `input` into a freshly allocated buffer.
    fn encode_buffer(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompress `input` into a freshly allocated buffer.
    fn decode_buffer(&self, input: &[u8]) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn codec_trait_is_object_shaped() {
        let codec: Box<dyn Codec> = Box::new(Identity);
        assert_eq!(codec.id(), CodecId::Rle);
        assert_eq!(codec.encode_buffer(b"hi").unwrap(), b"hi");
    }

    #[test]
    fn every_codec_id_round_trips_through_its_byte() {
        let all = [
            CodecId::Huffman,
            CodecId::Rle,
            CodecId::Lz77,
            CodecId::ObfuscatedLz77,
            CodecId::HuffmanParallel,
            CodecId::RleParallel,
            CodecId::Lz77Parallel,
            CodecId::Progressive,
        ];
        for id in all {
            assert_eq!(CodecId::from_u8(id.to_u8()).unwrap(), id);
        }
    }

    #[test]
    fn unknown_codec_byte_is_unsupported() {
        assert!(CodecId::from_u8(200).is_err());
    }
}
