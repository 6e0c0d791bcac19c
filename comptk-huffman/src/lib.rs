//! Canonical Huffman codec (C3): tree construction, whole-buffer codec, and
//! chunked streaming for inputs too large to hold in memory at once.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod streaming;
pub mod tree;

pub use codec::Huffman;
pub use tree::{Code, CodeTable, Tree};
