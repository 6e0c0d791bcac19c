//! §8 testable properties that cut across more than one codec or container:
//! round-trip laws, determinism, size monotonicity, and the parallel/serial
//! equivalence law. Scenario-specific numbers live in `scenarios.rs`.

use comptk_core::checksum::ChecksumKind;
use comptk_core::codec::Codec;
use comptk_core::config::{Lz77Params, OptimizationGoal};
use comptk_huffman::Huffman;
use comptk_lz77::Lz77;
use comptk_rle::Rle;

fn lcg_fill(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

fn sample_inputs() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        b"a".to_vec(),
        b"abababababababab".to_vec(),
        b"the quick brown fox jumps over the lazy dog".repeat(20),
        lcg_fill(5000, 123),
        vec![0u8; 500],
    ]
}

#[test]
fn every_codec_round_trips_every_sample() {
    let codecs: Vec<Box<dyn Codec>> = vec![
        Box::new(Huffman::default()),
        Box::new(Rle),
        Box::new(Lz77::new(Lz77Params::DEFAULT)),
        Box::new(comptk_lz77::ObfuscatedLz77::new(Lz77Params::DEFAULT, "secret".to_string()).unwrap()),
    ];
    for codec in &codecs {
        for input in sample_inputs() {
            let encoded = codec.encode_buffer(&input).unwrap();
            let decoded = codec.decode_buffer(&encoded).unwrap();
            assert_eq!(decoded, input, "codec {:?} failed to round-trip", codec.id());
        }
    }
}

#[test]
fn encoding_is_deterministic() {
    let input = b"the quick brown fox jumps over the lazy dog".repeat(7);
    let codec = Huffman::for_goal(OptimizationGoal::Size);
    let a = codec.encode_buffer(&input).unwrap();
    let b = codec.encode_buffer(&input).unwrap();
    assert_eq!(a, b);

    let lz = Lz77::new(Lz77Params::SIZE);
    assert_eq!(lz.encode_buffer(&input).unwrap(), lz.encode_buffer(&input).unwrap());
}

#[test]
fn rle_size_is_exactly_header_plus_two_bytes_per_run_of_up_to_255() {
    for n in [1usize, 10, 255, 256, 510, 511, 1000] {
        let input = vec![b'x'; n];
        let encoded = Rle.encode_buffer(&input).unwrap();
        let expected_runs = n.div_ceil(255);
        assert_eq!(encoded.len(), 8 + 2 * expected_runs);
    }
}

#[test]
fn parallel_compression_matches_serial_after_decoding() {
    let codec = Rle;
    let input = lcg_fill(200_000, 5).into_iter().map(|b| b % 4).collect::<Vec<u8>>();

    let serial = codec.encode_buffer(&input).unwrap();
    let serial_roundtrip = codec.decode_buffer(&serial).unwrap();

    let parallel_encoded = comptk_parallel::compress(&codec, &input, 4).unwrap();
    let parallel_roundtrip = comptk_parallel::decompress(&codec, &parallel_encoded).unwrap();

    assert_eq!(serial_roundtrip, input);
    assert_eq!(parallel_roundtrip, input);
}

#[test]
fn progressive_container_detects_corrupted_blocks() {
    let codec = Rle;
    let input = lcg_fill(10_000, 9);
    let mut encoded =
        comptk_container::progressive::encode_file(&input, &codec, 1000, ChecksumKind::Crc32).unwrap();
    let last = encoded.len() - 1;
    encoded[last] ^= 0xFF;
    assert!(comptk_container::progressive::decode_file(&encoded, &codec).is_err());
}

#[test]
fn split_container_round_trips_for_several_part_sizes() {
    let codec = Huffman::default();
    let input = b"mississippi river".repeat(500);
    for max_part_size in [64usize, 500, 4096] {
        let parts = comptk_container::split::write(&input, &codec, max_part_size, ChecksumKind::Md5).unwrap();
        let decoded = comptk_container::split::read(&parts, &codec).unwrap();
        assert_eq!(decoded, input);
    }
}
