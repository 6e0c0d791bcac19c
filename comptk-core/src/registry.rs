//! Codec registry (C7): codec ids, names, file extensions.

use crate::codec::CodecId;
use crate::error::{CompError, Result};

/// One registry entry: a codec's canonical name and file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    /// The codec id this entry describes.
    pub id: CodecId,
    /// Canonical lowercase name, e.g. `"huffman"`.
    pub name: &'static str,
    /// File extension, including the dot, e.g. `".huf"`.
    pub extension: &'static str,
}

const REGISTRY: &[CodecInfo] = &[
    CodecInfo {
        id: CodecId::Huffman,
        name: "huffman",
        extension: ".huf",
    },
    CodecInfo {
        id: CodecId::Rle,
        name: "rle",
        extension: ".rle",
    },
    CodecInfo {
        id: CodecId::Lz77,
        name: "lz77",
        extension: ".lz77",
    },
    CodecInfo {
        id: CodecId::ObfuscatedLz77,
        name: "lz77-obfuscated",
        extension: ".lz77e",
    },
    CodecInfo {
        id: CodecId::HuffmanParallel,
        name: "huffman-parallel",
        extension: ".hufp",
    },
    CodecInfo {
        id: CodecId::RleParallel,
        name: "rle-parallel",
        extension: ".rlep",
    },
    CodecInfo {
        id: CodecId::Lz77Parallel,
        name: "lz77-parallel",
        extension: ".lz77p",
    },
    CodecInfo {
        id: CodecId::Progressive,
        name: "progressive",
        extension: ".prog",
    },
];

/// Look up registry information for a codec id.
pub fn info(id: CodecId) -> CodecInfo {
    *REGISTRY
        .iter()
        .find(|entry| entry.id == id)
        .expect("every CodecId variant has a registry entry")
}

/// Infer a codec id from a filename's extension, for coordinator
/// convenience when `decompress` is not told which codec to use.
pub fn infer_from_extension(filename: &str) -> Result<CodecId> {
    REGISTRY
        .iter()
        .find(|entry| filename.ends_with(entry.extension))
        .map(|entry| entry.id)
        .ok_or_else(|| {
            CompError::unsupported(format!(
                "cannot infer codec from filename extension: {filename}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_codec_has_a_distinct_extension() {
        let mut extensions: Vec<&str> = REGISTRY.iter().map(|e| e.extension).collect();
        extensions.sort_unstable();
        extensions.dedup();
        assert_eq!(extensions.len(), REGISTRY.len());
    }

    #[test]
    fn infers_codec_from_extension() {
        assert_eq!(
            infer_from_extension("archive.hufp").unwrap(),
            CodecId::HuffmanParallel
        );
        assert_eq!(infer_from_extension("data.lz77").unwrap(), CodecId::Lz77);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(infer_from_extension("data.zip").is_err());
    }
}
