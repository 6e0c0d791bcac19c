//! File-path wrapper around [`comptk_dedup`].

use std::fs;
use std::path::Path;

use comptk_core::error::{CompError, Result};
pub use comptk_dedup::{ChunkMode, DedupStats};

/// Fingerprint algorithm requested for a dedup pass.
///
/// The engine only implements SHA-1 fingerprinting; the other variants are
/// accepted so callers can name the full interface, and rejected with a
/// clear error rather than silently substituting a different hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-1, the only algorithm this workspace's dedup engine implements.
    Sha1,
    /// Not implemented; requesting it is an error.
    Md5,
    /// Not implemented; requesting it is an error.
    Crc32,
    /// Not implemented; requesting it is an error.
    Xxh64,
}

/// Deduplicate `input_path` into `output_path`, returning statistics about
/// the pass.
pub fn dedup_compress(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    chunk_size: usize,
    hash_alg: HashAlg,
    mode: ChunkMode,
) -> Result<DedupStats> {
    if hash_alg != HashAlg::Sha1 {
        return Err(CompError::unsupported(format!(
            "{hash_alg:?} fingerprinting is not implemented; only Sha1 is"
        )));
    }
    let input = fs::read(input_path.as_ref())?;
    let (stream, stats) = comptk_dedup::compress(&input, mode, chunk_size)?;
    fs::write(output_path.as_ref(), stream)?;
    Ok(stats)
}

/// Reconstruct the original file from a dedup stream written by
/// [`dedup_compress`].
pub fn dedup_decompress(input_path: impl AsRef<Path>, output_path: impl AsRef<Path>) -> Result<()> {
    let stream = fs::read(input_path.as_ref())?;
    let output = comptk_dedup::decompress(&stream)?;
    fs::write(output_path.as_ref(), output)?;
    Ok(())
}
