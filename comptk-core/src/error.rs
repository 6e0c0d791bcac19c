//! Error types shared by every comptk crate.
//!
//! One enum covers the taxonomy every codec, container and the dedup engine
//! report through: I/O failures, malformed streams, unsupported requests,
//! bad arguments, short output buffers, and internal allocation failures.

use std::io;
use thiserror::Error;

/// The error type returned by comptk operations.
#[derive(Debug, Error)]
pub enum CompError {
    /// Underlying I/O failure (open, read, or write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Archive/stream magic bytes did not match what was expected.
    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        /// Expected magic bytes.
        expected: &'static [u8],
        /// Bytes actually read.
        found: Vec<u8>,
    },

    /// Format version is newer than this implementation understands.
    #[error("unsupported format version {found} (max supported {max})")]
    UnsupportedVersion {
        /// Version byte read from the stream.
        found: u8,
        /// Highest version this implementation understands.
        max: u8,
    },

    /// Header or block was truncated before all declared bytes arrived.
    #[error("truncated stream: expected {expected} more bytes at offset {offset}")]
    Truncated {
        /// Byte offset where the truncation was noticed.
        offset: u64,
        /// Number of bytes still expected.
        expected: usize,
    },

    /// A progressive container block failed its checksum.
    #[error("corrupt block {block_id}: {reason}")]
    CorruptBlock {
        /// Sequence number of the offending block.
        block_id: u32,
        /// What went wrong.
        reason: String,
    },

    /// The file-level checksum did not match after reassembly.
    #[error("corrupt stream: {reason}")]
    CorruptStream {
        /// What went wrong.
        reason: String,
    },

    /// A Huffman tree could not be reconstructed from its serialized form.
    #[error("bad huffman tree: {reason}")]
    BadHuffmanTree {
        /// What went wrong while reading the tree.
        reason: String,
    },

    /// An LZ77 back-reference pointed outside the already-decoded output.
    #[error("invalid back-reference: offset {offset} at position {position}")]
    InvalidReference {
        /// The offending offset.
        offset: usize,
        /// Output position at the time the reference was read.
        position: usize,
    },

    /// A split-volume part was missing, out of order, or had a bad header.
    #[error("part {part} of split archive is bad: {reason}")]
    BadPart {
        /// 1-based part number.
        part: u32,
        /// What went wrong.
        reason: String,
    },

    /// A requested codec id, version, or option combination is not recognized.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Caller-supplied argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-supplied output buffer was too small; decoder state is
    /// preserved so the caller can retry with a larger buffer.
    #[error("output buffer too small: need at least {needed} bytes, have {available}")]
    ShortBuffer {
        /// Minimum buffer size that would have succeeded.
        needed: usize,
        /// Buffer size actually supplied.
        available: usize,
    },

    /// Something went wrong that indicates a bug rather than bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias used throughout comptk.
pub type Result<T> = std::result::Result<T, CompError>;

impl CompError {
    /// Build a [`CompError::BadMagic`].
    pub fn bad_magic(expected: &'static [u8], found: impl Into<Vec<u8>>) -> Self {
        Self::BadMagic {
            expected,
            found: found.into(),
        }
    }

    /// Build a [`CompError::UnsupportedVersion`].
    pub fn unsupported_version(found: u8, max: u8) -> Self {
        Self::UnsupportedVersion { found, max }
    }

    /// Build a [`CompError::Truncated`].
    pub fn truncated(offset: u64, expected: usize) -> Self {
        Self::Truncated { offset, expected }
    }

    /// Build a [`CompError::CorruptBlock`].
    pub fn corrupt_block(block_id: u32, reason: impl Into<String>) -> Self {
        Self::CorruptBlock {
            block_id,
            reason: reason.into(),
        }
    }

    /// Build a [`CompError::CorruptStream`].
    pub fn corrupt_stream(reason: impl Into<String>) -> Self {
        Self::CorruptStream {
            reason: reason.into(),
        }
    }

    /// Build a [`CompError::BadHuffmanTree`].
    pub fn bad_huffman_tree(reason: impl Into<String>) -> Self {
        Self::BadHuffmanTree {
            reason: reason.into(),
        }
    }

    /// Build a [`CompError::InvalidReference`].
    pub fn invalid_reference(offset: usize, position: usize) -> Self {
        Self::InvalidReference { offset, position }
    }

    /// Build a [`CompError::BadPart`].
    pub fn bad_part(part: u32, reason: impl Into<String>) -> Self {
        Self::BadPart {
            part,
            reason: reason.into(),
        }
    }

    /// Build a [`CompError::Unsupported`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Build a [`CompError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Build a [`CompError::ShortBuffer`].
    pub fn short_buffer(needed: usize, available: usize) -> Self {
        Self::ShortBuffer { needed, available }
    }

    /// Build a [`CompError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_offending_object() {
        let err = CompError::corrupt_block(3, "checksum mismatch");
        assert!(err.to_string().contains("block 3"));

        let err = CompError::bad_part(2, "missing file");
        assert!(err.to_string().contains("part 2"));

        let err = CompError::invalid_reference(40, 10);
        assert!(err.to_string().contains("offset 40"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "nope");
        let err: CompError = io_err.into();
        assert!(matches!(err, CompError::Io(_)));
    }
}
