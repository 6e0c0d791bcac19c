//! LZ77 token stream decoding: overlapping-copy expansion.

use crate::token::Token;
use comptk_core::error::{CompError, Result};

/// Decode a token stream produced by [`crate::encode::encode`] back into
/// `original_len` bytes.
pub fn decode(tokens: &[u8], original_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(original_len);
    let mut pos = 0usize;

    while pos < tokens.len() {
        let (token, consumed) = Token::read_from(tokens, pos)?;
        pos += consumed;

        match token {
            Token::Literal(byte) => {
                if out.len() >= original_len {
                    return Err(CompError::corrupt_stream(
                        "lz77 literal would overshoot declared length",
                    ));
                }
                out.push(byte);
            }
            Token::Reference { offset, length } => {
                let offset = offset as usize;
                let cur = out.len();
                if offset == 0 || offset > cur {
                    return Err(CompError::invalid_reference(offset, cur));
                }
                if cur + length as usize > original_len {
                    return Err(CompError::invalid_reference(offset, cur));
                }
                // Overlapping copy: the source region can extend into
                // bytes this very loop is about to write.
                for i in 0..length as usize {
                    let byte = out[cur + i - offset];
                    out.push(byte);
                }
            }
        }
    }

    if out.len() != original_len {
        return Err(CompError::truncated(0, original_len - out.len()));
    }
    Ok(out)
}
