//! Container formats (C9, C10): the progressive block container and the
//! split-volume archive.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod progressive;
pub mod split;

pub use progressive::{Header as ProgressiveHeader, ProgressiveReader, ReaderState};
