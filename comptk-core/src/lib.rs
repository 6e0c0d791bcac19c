//! # comptk-core
//!
//! Shared building blocks for the comptk compression toolkit:
//!
//! - [`error`]: the crate-wide error taxonomy.
//! - [`config`]: per-request configuration (optimization goal, buffer size,
//!   thread count, checksum type, encryption key) threaded through calls
//!   instead of living in process-wide globals.
//! - [`checksum`]: the checksum kit (C1) — CRC-32, MD5, SHA-256, SHA-1.
//! - [`bitstream`]: bit-level I/O for the Huffman codec.
//! - [`io`]: chunked, bounded-memory file I/O (C2).
//! - [`codec`]: the [`codec::Codec`] trait and [`codec::CodecId`] enum.
//! - [`registry`]: codec id ↔ name ↔ extension mapping (C7).
//!
//! ## Layering
//!
//! ```text
//! comptk (coordinator, C12)
//!   ├─ comptk-container (C9, C10)
//!   ├─ comptk-dedup (C11)
//!   ├─ comptk-parallel (C8)
//!   ├─ comptk-huffman / comptk-rle / comptk-lz77 (C3-C6)
//!   └─ comptk-core (C1, C2, C7, this crate)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitstream;
pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
pub mod io;
pub mod registry;

pub use codec::{Codec, CodecId};
pub use config::Config;
pub use error::{CompError, Result};
