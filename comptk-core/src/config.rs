//! Per-operation configuration.
//!
//! The source program keeps the optimization preset, I/O buffer size, thread
//! count and encryption key as process-wide globals. Here they are fields of
//! a [`Config`] value built once per request and threaded by reference into
//! every codec and container call — nothing about an operation lives outside
//! this value plus the buffers the caller owns.

use crate::checksum::ChecksumKind;

/// Which codec parameter preset to use.
///
/// Affects only the LZ77 window/lookahead/min-match tuning and the Huffman
/// tree depth cap; it never changes wire-format semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationGoal {
    /// Balanced defaults.
    #[default]
    None,
    /// Smaller window, shallower tree: faster, usually larger output.
    Speed,
    /// Larger window, deeper tree: slower, usually smaller output.
    Size,
}

/// Sliding-window tuning for the LZ77 codec, selected by [`OptimizationGoal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lz77Params {
    /// Number of most-recently-produced bytes visible to the matcher.
    pub window_size: usize,
    /// Number of bytes of lookahead considered per match attempt.
    pub lookahead: usize,
    /// Minimum match length worth emitting as a back-reference.
    pub min_match: usize,
}

impl Lz77Params {
    /// Default preset: 4096 / 16 / 3.
    pub const DEFAULT: Self = Self {
        window_size: 4096,
        lookahead: 16,
        min_match: 3,
    };
    /// Speed preset: 1024 / 8 / 4.
    pub const SPEED: Self = Self {
        window_size: 1024,
        lookahead: 8,
        min_match: 4,
    };
    /// Size preset: 8192 / 32 / 2.
    pub const SIZE: Self = Self {
        window_size: 8192,
        lookahead: 32,
        min_match: 2,
    };

    /// Resolve the tuning for a given optimization goal.
    pub fn for_goal(goal: OptimizationGoal) -> Self {
        match goal {
            OptimizationGoal::None => Self::DEFAULT,
            OptimizationGoal::Speed => Self::SPEED,
            OptimizationGoal::Size => Self::SIZE,
        }
    }
}

/// Maximum Huffman code length in bits, selected by [`OptimizationGoal`].
pub fn huffman_max_depth(goal: OptimizationGoal) -> u32 {
    match goal {
        OptimizationGoal::None => 256,
        OptimizationGoal::Speed => 32,
        OptimizationGoal::Size => 512,
    }
}

/// Per-request configuration threaded through every operation.
///
/// Built once by the coordinator; never mutated after construction, and
/// never stored in a global — every function that needs it takes `&Config`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Codec parameter preset.
    pub optimization_goal: OptimizationGoal,
    /// I/O buffer cap in bytes for chunked readers/writers.
    pub buffer_size_bytes: usize,
    /// Parallel worker count; 0 means auto-detect from available parallelism.
    pub thread_count: usize,
    /// Engage chunked, bounded-memory I/O for Huffman file operations.
    pub large_file_mode: bool,
    /// Checksum algorithm used by containers that embed one.
    pub checksum_type: ChecksumKind,
    /// Repeating XOR key for the obfuscation wrapper, if any.
    pub encryption_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            optimization_goal: OptimizationGoal::None,
            buffer_size_bytes: 8192,
            thread_count: 0,
            large_file_mode: false,
            checksum_type: ChecksumKind::None,
            encryption_key: None,
        }
    }
}

impl Config {
    /// Resolve `thread_count` to a concrete worker count, falling back to
    /// the machine's available parallelism when it is 0.
    pub fn resolved_thread_count(&self) -> usize {
        if self.thread_count == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.thread_count.clamp(1, 64)
        }
    }

    /// Resolve the LZ77 window parameters for this configuration's goal.
    pub fn lz77_params(&self) -> Lz77Params {
        Lz77Params::for_goal(self.optimization_goal)
    }

    /// Resolve the Huffman tree depth cap for this configuration's goal.
    pub fn huffman_max_depth(&self) -> u32 {
        huffman_max_depth(self.optimization_goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_zero_resolves_to_at_least_one() {
        let cfg = Config::default();
        assert!(cfg.resolved_thread_count() >= 1);
    }

    #[test]
    fn thread_count_explicit_is_clamped() {
        let mut cfg = Config::default();
        cfg.thread_count = 9000;
        assert_eq!(cfg.resolved_thread_count(), 64);
    }

    #[test]
    fn presets_match_documented_defaults() {
        assert_eq!(Lz77Params::DEFAULT.window_size, 4096);
        assert_eq!(Lz77Params::SPEED.min_match, 4);
        assert_eq!(Lz77Params::SIZE.lookahead, 32);
    }
}
