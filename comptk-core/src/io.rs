//! Chunked I/O (C2): bounded-memory reading and writing of fixed-size
//! byte windows, so an operation's peak memory does not scale with file
//! size.

use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Default chunk size: 1 MiB, matching the block container's default.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Reads a file in successive fixed-size windows.
///
/// `next_chunk` returns `Ok(None)` once the file is exhausted. A short final
/// read (less than `chunk_size` bytes at end of file) is not an error.
pub struct ChunkedReader {
    file: File,
    chunk_size: usize,
    total_size: u64,
}

impl ChunkedReader {
    /// Open `path` for chunked reading with the given window size.
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        let total_size = file.metadata()?.len();
        Ok(Self {
            file,
            chunk_size,
            total_size,
        })
    }

    /// Total size of the underlying file in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Configured window size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read the next window, or `None` at end of file.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }

    /// Seek back to the start of the file so iteration can begin again.
    pub fn reset(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

/// Buffers writes up to a fixed capacity before flushing to the underlying
/// file, guaranteeing a flush on [`ChunkedWriter::finish`] or [`Drop`].
pub struct ChunkedWriter {
    inner: BufWriter<File>,
}

impl ChunkedWriter {
    /// Create (or truncate) `path` for buffered writing with `capacity`
    /// bytes of internal buffer.
    pub fn create(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: BufWriter::with_capacity(capacity.max(1), file),
        })
    }

    /// Write a chunk, buffering as needed.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        Ok(())
    }

    /// Flush any buffered bytes and close out the writer.
    pub fn finish(mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

impl Drop for ChunkedWriter {
    fn drop(&mut self) {
        let _ = self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn reader_yields_fixed_windows_then_none() {
        let dir = std::env::temp_dir().join(format!("comptk-io-test-{}", std::process::id()));
        std::fs::write(&dir, vec![1u8; 10]).unwrap();

        let mut reader = ChunkedReader::open(&dir, 4).unwrap();
        assert_eq!(reader.total_size(), 10);
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 4);
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 4);
        assert_eq!(reader.next_chunk().unwrap().unwrap().len(), 2);
        assert!(reader.next_chunk().unwrap().is_none());

        std::fs::remove_file(&dir).unwrap();
    }

    #[test]
    fn reset_rewinds_to_start() {
        let dir = std::env::temp_dir().join(format!("comptk-io-test-reset-{}", std::process::id()));
        std::fs::write(&dir, vec![7u8; 6]).unwrap();

        let mut reader = ChunkedReader::open(&dir, 3).unwrap();
        reader.next_chunk().unwrap();
        reader.reset().unwrap();
        let first = reader.next_chunk().unwrap().unwrap();
        assert_eq!(first, vec![7u8; 3]);

        std::fs::remove_file(&dir).unwrap();
    }

    #[test]
    fn writer_flushes_on_finish() {
        let dir = std::env::temp_dir().join(format!("comptk-io-test-write-{}", std::process::id()));
        {
            let mut writer = ChunkedWriter::create(&dir, 4).unwrap();
            writer.write_chunk(b"hello").unwrap();
            writer.write_chunk(b" world").unwrap();
            writer.finish().unwrap();
        }
        let mut contents = Vec::new();
        File::open(&dir).unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"hello world");

        std::fs::remove_file(&dir).unwrap();
    }
}
