//! Chunked Huffman encode/decode for files too large to hold in RAM.
//!
//! Encoding is a true two-pass operation: pass 1 scans every chunk to
//! accumulate one frequency table and build a single tree; pass 2 walks the
//! chunks again and emits bits against that tree, using a single
//! continuous bit stream for the tree header and every chunk's body (no
//! byte-alignment gap between them). Decoding carries its state (current
//! tree node, bytes emitted so far) across calls so a caller can feed it
//! one [`comptk_core::io::ChunkedReader`] window at a time.

use crate::tree::Tree;
use comptk_core::bitstream::{BitReader, BitWriter};
use comptk_core::error::{CompError, Result};

/// Accumulates frequencies across however many chunks the caller feeds it,
/// then builds the tree once every chunk has been seen.
#[derive(Debug)]
pub struct FrequencyAccumulator {
    freqs: [u64; 256],
}

impl Default for FrequencyAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyAccumulator {
    /// A fresh accumulator with all frequencies at zero.
    pub fn new() -> Self {
        Self { freqs: [0; 256] }
    }

    /// Fold one chunk's bytes into the running frequency table.
    pub fn observe(&mut self, chunk: &[u8]) {
        for &b in chunk {
            self.freqs[b as usize] += 1;
        }
    }

    /// Build the tree pass 2 will encode against.
    pub fn build_tree(&self, max_depth: u32) -> Option<(Tree, crate::tree::CodeTable)> {
        Tree::build(&self.freqs, max_depth)
    }
}

/// Pass-2 encoder: writes the tree header once, then accepts chunk bodies
/// against a single continuous bit stream.
pub struct StreamEncoder<W: std::io::Write> {
    table: crate::tree::CodeTable,
    writer: BitWriter<W>,
}

impl<W: std::io::Write> StreamEncoder<W> {
    /// Write the tree header and return an encoder ready for chunk bodies.
    pub fn begin(tree: &Tree, table: crate::tree::CodeTable, writer: W) -> Result<Self> {
        let mut writer = BitWriter::new(writer);
        tree.write_to(&mut writer)?;
        Ok(Self { table, writer })
    }

    /// Encode one chunk's worth of bytes into the underlying writer.
    pub fn encode_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        for &byte in chunk {
            let code = self
                .table
                .get(byte)
                .ok_or_else(|| CompError::internal("byte missing from frequency table"))?;
            self.writer.write_bits(code.bits, code.length)?;
        }
        Ok(())
    }

    /// Flush the final partial byte and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer.into_inner()
    }
}

/// Streaming decoder: owns the bit reader across the tree header and every
/// subsequent chunk, and decodes into caller-provided output buffers,
/// carrying tree position across short-buffer retries.
pub struct StreamDecoder<R: std::io::Read> {
    tree: Tree,
    reader: BitReader<R>,
    original_len: usize,
    node: Option<u32>,
    emitted: usize,
}

impl<R: std::io::Read> StreamDecoder<R> {
    /// Read the tree header from `reader` and return a decoder positioned
    /// right after it, ready to decode `original_len` bytes of body.
    pub fn begin(reader: R, original_len: usize) -> Result<Self> {
        let mut reader = BitReader::new(reader);
        let tree = Tree::read_from(&mut reader)?;
        Ok(Self {
            tree,
            reader,
            original_len,
            node: None,
            emitted: 0,
        })
    }

    /// Decode into `out`, stopping when `out` is full or the declared
    /// original length has been reached. Returns the number of bytes
    /// written. Call again with a fresh buffer to continue from where this
    /// call left off.
    ///
    /// Every Huffman symbol decodes to exactly one byte, so the only buffer
    /// too small to make progress is an empty one; that case returns
    /// [`CompError::ShortBuffer`] with the decoder state untouched, so the
    /// caller can retry with a larger buffer.
    pub fn decode_into(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() && self.emitted < self.original_len {
            return Err(CompError::short_buffer(1, 0));
        }
        let mut written = 0;
        while written < out.len() && self.emitted < self.original_len {
            let (next, byte) = self.tree.step(&mut self.reader, self.node)?;
            self.node = Some(next);
            if let Some(b) = byte {
                out[written] = b;
                written += 1;
                self.emitted += 1;
            }
        }
        Ok(written)
    }

    /// Whether every declared byte has been emitted.
    pub fn is_done(&self) -> bool {
        self.emitted >= self.original_len
    }

    /// Bytes emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

/// Convenience one-shot decode of an in-memory buffer through the chunked
/// machinery, exercised by tests and small callers that do not need true
/// streaming.
pub fn decode_all<R: std::io::Read>(reader: R, original_len: usize) -> Result<Vec<u8>> {
    let mut decoder = StreamDecoder::begin(reader, original_len)?;
    let mut out = vec![0u8; original_len];
    let mut total = 0;
    while total < original_len {
        let n = decoder.decode_into(&mut out[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    if total != original_len {
        return Err(CompError::truncated(0, original_len - total));
    }
    Ok(out)
}
