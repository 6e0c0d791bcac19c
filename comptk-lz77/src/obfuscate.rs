//! Obfuscation wrapper (C6): LZ77 compress, then XOR the result byte-wise
//! against a repeating key, prefixed with the ASCII tag `"ENCRYPTED"`.
//!
//! This is not encryption: no IV, no authenticity, single-byte XOR against
//! a known-plaintext-recoverable key. A real cipher (AES-CTR plus an
//! HMAC) would be a format-versioned alternative, but this workspace
//! keeps the literal XOR scheme the name describes.

use crate::codec::Lz77;
use comptk_core::codec::{Codec, CodecId};
use comptk_core::config::Lz77Params;
use comptk_core::error::{CompError, Result};

const TAG: &[u8] = b"ENCRYPTED";

fn xor_with_key(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &b)| b ^ key[i % key.len()])
        .collect()
}

/// LZ77 plus repeating-key XOR.
#[derive(Debug, Clone)]
pub struct ObfuscatedLz77 {
    inner: Lz77,
    key: String,
}

impl ObfuscatedLz77 {
    /// Build the wrapper around the given LZ77 tuning and XOR key. The key
    /// must not be empty.
    pub fn new(params: Lz77Params, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(CompError::invalid_argument(
                "obfuscation key must not be empty",
            ));
        }
        Ok(Self {
            inner: Lz77::new(params),
            key,
        })
    }
}

impl Codec for ObfuscatedLz77 {
    fn id(&self) -> CodecId {
        CodecId::ObfuscatedLz77
    }

    fn encode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        let compressed = self.inner.encode_buffer(input)?;
        let scrambled = xor_with_key(&compressed, self.key.as_bytes());
        let mut out = TAG.to_vec();
        out.extend(scrambled);
        Ok(out)
    }

    fn decode_buffer(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < TAG.len() || &input[..TAG.len()] != TAG {
            return Err(CompError::corrupt_stream(
                "obfuscated stream is missing the ENCRYPTED tag",
            ));
        }
        let scrambled = &input[TAG.len()..];
        let compressed = xor_with_key(scrambled, self.key.as_bytes());
        self.inner.decode_buffer(&compressed)
    }
}
