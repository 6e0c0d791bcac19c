//! The LZ77 token wire format: a 1-byte tag followed by either a literal
//! byte or a big-endian `u16` offset plus a `u8` length. The big-endian
//! offset is kept even though every other integer in this workspace is
//! little-endian, an intentional carryover to stay wire-compatible with
//! the format this token layout was modeled on.

use comptk_core::error::{CompError, Result};

const TAG_LITERAL: u8 = 0;
const TAG_REFERENCE: u8 = 1;

/// One emitted LZ77 token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A single byte copied verbatim.
    Literal(u8),
    /// A back-reference: `offset` bytes behind the current position,
    /// `length` bytes to copy.
    Reference {
        /// Distance back from the current output position, 1-based.
        offset: u16,
        /// Number of bytes to copy.
        length: u8,
    },
}

impl Token {
    /// Append this token's wire representation to `out`.
    pub fn write_to(self, out: &mut Vec<u8>) {
        match self {
            Token::Literal(byte) => {
                out.push(TAG_LITERAL);
                out.push(byte);
            }
            Token::Reference { offset, length } => {
                out.push(TAG_REFERENCE);
                out.extend_from_slice(&offset.to_be_bytes());
                out.push(length);
            }
        }
    }

    /// Read one token from `input` starting at `pos`, returning it and the
    /// number of bytes consumed.
    pub fn read_from(input: &[u8], pos: usize) -> Result<(Token, usize)> {
        let tag = *input
            .get(pos)
            .ok_or_else(|| CompError::truncated(pos as u64, 1))?;
        match tag {
            TAG_LITERAL => {
                let byte = *input
                    .get(pos + 1)
                    .ok_or_else(|| CompError::truncated(pos as u64, 1))?;
                Ok((Token::Literal(byte), 2))
            }
            TAG_REFERENCE => {
                let bytes = input
                    .get(pos + 1..pos + 4)
                    .ok_or_else(|| CompError::truncated(pos as u64, 3))?;
                let offset = u16::from_be_bytes([bytes[0], bytes[1]]);
                let length = bytes[2];
                Ok((Token::Reference { offset, length }, 4))
            }
            other => Err(CompError::corrupt_stream(format!(
                "unknown lz77 token tag {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_round_trips() {
        let mut buf = Vec::new();
        Token::Literal(b'A').write_to(&mut buf);
        let (token, consumed) = Token::read_from(&buf, 0).unwrap();
        assert_eq!(token, Token::Literal(b'A'));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn reference_round_trips_big_endian_offset() {
        let mut buf = Vec::new();
        Token::Reference {
            offset: 0x0102,
            length: 9,
        }
        .write_to(&mut buf);
        assert_eq!(&buf[1..3], &[0x01, 0x02]);
        let (token, consumed) = Token::read_from(&buf, 0).unwrap();
        assert_eq!(
            token,
            Token::Reference {
                offset: 0x0102,
                length: 9
            }
        );
        assert_eq!(consumed, 4);
    }

    #[test]
    fn truncated_token_is_an_error() {
        assert!(Token::read_from(&[TAG_REFERENCE, 0x00], 0).is_err());
    }
}
