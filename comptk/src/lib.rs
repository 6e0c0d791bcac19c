//! Coordinator (C12): resolves a compression request into codec and
//! container calls and owns all file I/O. Every crate below this one works
//! on in-memory buffers only; this crate is the only place a [`std::fs`]
//! call or a [`comptk_core::io::ChunkedReader`] appears.
//!
//! Has no algorithmic complexity of its own: it builds a codec from a
//! [`comptk_core::codec::CodecId`] plus a [`Config`], picks a container,
//! and dispatches.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dedup;

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use comptk_core::checksum::ChecksumKind;
use comptk_core::codec::{Codec, CodecId};
use comptk_core::config::Config;
use comptk_core::error::{CompError, Result};
use comptk_core::io::ChunkedReader;

use comptk_huffman::streaming::{StreamDecoder, StreamEncoder};
use comptk_huffman::Huffman;
use comptk_lz77::{Lz77, ObfuscatedLz77};
use comptk_rle::Rle;

pub use dedup::{dedup_compress, dedup_decompress, ChunkMode, DedupStats, HashAlg};

/// Which container wraps the chosen codec's byte stream. Progressive and
/// split have their own entry points below since they take extra
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// No wrapping: the codec's own buffer format.
    Raw,
    /// Chunked and compressed concurrently across a thread pool (C8).
    Parallel,
}

/// Build the byte-stream codec named by `id`, tuned by `config`.
///
/// `id` must be one of the four primitive codecs (Huffman, RLE, LZ77, or
/// the obfuscation wrapper); the parallel/progressive ids exist only to
/// tag container headers, not to be requested here.
fn build_codec(id: CodecId, config: &Config) -> Result<Box<dyn Codec + Sync>> {
    match id {
        CodecId::Huffman => Ok(Box::new(Huffman::for_goal(config.optimization_goal))),
        CodecId::Rle => Ok(Box::new(Rle)),
        CodecId::Lz77 => Ok(Box::new(Lz77::new(config.lz77_params()))),
        CodecId::ObfuscatedLz77 => {
            let key = config.encryption_key.clone().ok_or_else(|| {
                CompError::invalid_argument("obfuscated LZ77 requires an encryption key")
            })?;
            Ok(Box::new(ObfuscatedLz77::new(config.lz77_params(), key)?))
        }
        other => Err(CompError::unsupported(format!(
            "{other:?} is a container id, not a requestable codec"
        ))),
    }
}

/// Compress `input_path` into `output_path` through the raw or parallel
/// container.
///
/// When `codec_id` is [`CodecId::Huffman`], `container` is [`Container::Raw`]
/// and `config.large_file_mode` is set, this streams the file through
/// bounded-memory chunked I/O instead of reading it whole.
pub fn compress(
    codec_id: CodecId,
    container: Container,
    config: &Config,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;

    if container == Container::Raw && codec_id == CodecId::Huffman && config.large_file_mode {
        return compress_huffman_streaming(config, input_path.as_ref(), output_path.as_ref());
    }

    let input = fs::read(input_path.as_ref())?;
    let output = match container {
        Container::Raw => codec.encode_buffer(&input)?,
        Container::Parallel => {
            comptk_parallel::compress(codec.as_ref(), &input, config.resolved_thread_count())?
        }
    };
    fs::write(output_path.as_ref(), output)?;
    Ok(())
}

/// Decompress `input_path` into `output_path`, mirroring [`compress`].
pub fn decompress(
    codec_id: CodecId,
    container: Container,
    config: &Config,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;

    if container == Container::Raw && codec_id == CodecId::Huffman && config.large_file_mode {
        return decompress_huffman_streaming(config, input_path.as_ref(), output_path.as_ref());
    }

    let input = fs::read(input_path.as_ref())?;
    let output = match container {
        Container::Raw => codec.decode_buffer(&input)?,
        Container::Parallel => comptk_parallel::decompress(codec.as_ref(), &input)?,
    };
    fs::write(output_path.as_ref(), output)?;
    Ok(())
}

/// Two-pass Huffman encode of a file too large to hold in RAM, bounded to
/// `config.buffer_size_bytes` bytes resident at once.
///
/// Deletes `output_path` if any step after its creation fails, so a failed
/// compression never leaves a partial file behind.
fn compress_huffman_streaming(config: &Config, input_path: &Path, output_path: &Path) -> Result<()> {
    let result = compress_huffman_streaming_attempt(config, input_path, output_path);
    if result.is_err() {
        let _ = fs::remove_file(output_path);
    }
    result
}

fn compress_huffman_streaming_attempt(
    config: &Config,
    input_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let chunk_size = config.buffer_size_bytes.max(1);
    let mut reader = ChunkedReader::open(input_path, chunk_size)?;
    let total_size = reader.total_size();

    let mut accumulator = comptk_huffman::streaming::FrequencyAccumulator::new();
    while let Some(chunk) = reader.next_chunk()? {
        accumulator.observe(&chunk);
    }

    let Some((tree, table)) = accumulator.build_tree(config.huffman_max_depth()) else {
        fs::write(output_path, total_size.to_le_bytes())?;
        return Ok(());
    };

    reader.reset()?;
    let out_file = fs::File::create(output_path)?;
    let mut writer = BufWriter::new(out_file);
    writer.write_all(&total_size.to_le_bytes())?;

    let mut encoder = StreamEncoder::begin(&tree, table, writer)?;
    while let Some(chunk) = reader.next_chunk()? {
        encoder.encode_chunk(&chunk)?;
    }
    let mut writer = encoder.finish()?;
    writer.flush()?;
    Ok(())
}

/// Streaming counterpart of [`compress_huffman_streaming`], same cleanup
/// guarantee on `output_path`.
fn decompress_huffman_streaming(config: &Config, input_path: &Path, output_path: &Path) -> Result<()> {
    let result = decompress_huffman_streaming_attempt(config, input_path, output_path);
    if result.is_err() {
        let _ = fs::remove_file(output_path);
    }
    result
}

fn decompress_huffman_streaming_attempt(
    config: &Config,
    input_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let mut reader = BufReader::new(fs::File::open(input_path)?);
    let mut len_bytes = [0u8; 8];
    reader.read_exact(&mut len_bytes)?;
    let original_len = u64::from_le_bytes(len_bytes) as usize;

    let mut writer = BufWriter::new(fs::File::create(output_path)?);
    if original_len == 0 {
        return Ok(());
    }

    let mut decoder = StreamDecoder::begin(reader, original_len)?;
    let mut buf = vec![0u8; config.buffer_size_bytes.max(1)];
    let mut total = 0;
    while total < original_len {
        let n = decoder.decode_into(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        total += n;
    }
    writer.flush()?;
    if total != original_len {
        return Err(CompError::truncated(0, (original_len - total) as usize));
    }
    Ok(())
}

/// Compress `input_path` into a progressive block container at
/// `output_path`.
pub fn progressive_compress(
    codec_id: CodecId,
    config: &Config,
    block_size: u32,
    checksum_kind: ChecksumKind,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;
    let input = fs::read(input_path.as_ref())?;
    let encoded = comptk_container::progressive::encode_file(&input, codec.as_ref(), block_size, checksum_kind)?;
    fs::write(output_path.as_ref(), encoded)?;
    Ok(())
}

/// Decode every block of a progressive container.
pub fn progressive_decompress(
    codec_id: CodecId,
    config: &Config,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;
    let input = fs::read(input_path.as_ref())?;
    let decoded = comptk_container::progressive::decode_file(&input, codec.as_ref())?;
    fs::write(output_path.as_ref(), decoded)?;
    Ok(())
}

/// Decode only blocks `start_block..=end_block` of a progressive container.
pub fn progressive_decompress_range(
    codec_id: CodecId,
    config: &Config,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    start_block: u32,
    end_block: u32,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;
    let input = fs::read(input_path.as_ref())?;
    let decoded =
        comptk_container::progressive::decode_range(&input, codec.as_ref(), start_block, end_block)?;
    fs::write(output_path.as_ref(), decoded)?;
    Ok(())
}

/// Decode a progressive container block by block, invoking `callback` after
/// each one; returning `false` stops iteration early.
pub fn progressive_stream(
    codec_id: CodecId,
    config: &Config,
    input_path: impl AsRef<Path>,
    callback: impl FnMut(&[u8]) -> bool,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;
    let input = fs::read(input_path.as_ref())?;
    comptk_container::progressive::stream(&input, codec.as_ref(), callback)
}

/// Compress the whole of `input_path` once, then split the result into
/// `output_basename.partNNNN` files no larger than `max_part_size` bytes of
/// payload each.
///
/// If writing any part fails, every part already written this call is
/// deleted rather than left as an incomplete set on disk.
pub fn split_compress(
    codec_id: CodecId,
    config: &Config,
    max_part_size: usize,
    checksum_kind: ChecksumKind,
    input_path: impl AsRef<Path>,
    output_basename: impl AsRef<Path>,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;
    let input = fs::read(input_path.as_ref())?;
    let parts = comptk_container::split::write(&input, codec.as_ref(), max_part_size, checksum_kind)?;

    let mut written = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let path = part_path(output_basename.as_ref(), i + 1);
        if let Err(err) = fs::write(&path, part) {
            for path in &written {
                let _ = fs::remove_file(path);
            }
            return Err(err.into());
        }
        written.push(path);
    }
    Ok(())
}

/// Reassemble and decompress a split archive written by [`split_compress`].
///
/// Reads `input_basename.part0001`, `.part0002`, ... until a part is
/// missing; the error names the offending part.
pub fn split_decompress(
    codec_id: CodecId,
    config: &Config,
    input_basename: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let codec = build_codec(codec_id, config)?;

    let first = fs::read(part_path(input_basename.as_ref(), 1))
        .map_err(|_| CompError::bad_part(1, "missing part"))?;
    let (_, total_parts) = comptk_container::split::peek_total_parts(&first)?;

    let mut parts = Vec::with_capacity(total_parts as usize);
    parts.push(first);
    for i in 2..=total_parts {
        let bytes = fs::read(part_path(input_basename.as_ref(), i as usize))
            .map_err(|_| CompError::bad_part(i, "missing part"))?;
        parts.push(bytes);
    }

    let decoded = comptk_container::split::read(&parts, codec.as_ref())?;
    fs::write(output_path.as_ref(), decoded)?;
    Ok(())
}

fn part_path(basename: &Path, part_number: usize) -> std::path::PathBuf {
    let mut name = basename.as_os_str().to_owned();
    name.push(format!(".part{part_number:04}"));
    name.into()
}
