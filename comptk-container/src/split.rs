//! Split-volume container (C10): a multi-file archive, compressed once as a
//! single stream and distributed across parts each bounded by a maximum
//! size, with per-part headers enabling sequential reassembly.
//!
//! Part files are represented here as in-memory byte buffers rather than
//! paths on disk — the caller (the coordinator, in the full toolkit) is
//! responsible for writing buffer *i* to `basename.part{i:04}` and reading
//! them back in order; this crate only owns the wire format and the
//! reassembly logic.

use comptk_core::checksum::{self, ChecksumKind, ChecksumRecord};
use comptk_core::codec::Codec;
use comptk_core::error::{CompError, Result};

const MAGIC: &[u8; 4] = b"SPLT";

struct PartHeader {
    part_number: u32,
    total_parts: u32,
    payload_size: u32,
    total_archive_bytes: u64,
    checksum: ChecksumRecord,
}

impl PartHeader {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.part_number.to_le_bytes());
        out.extend_from_slice(&self.total_parts.to_le_bytes());
        out.extend_from_slice(&self.payload_size.to_le_bytes());
        out.extend_from_slice(&self.total_archive_bytes.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_bytes());
    }

    fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 4 {
            return Err(CompError::truncated(0, 4 - data.len()));
        }
        if &data[0..4] != MAGIC {
            return Err(CompError::bad_magic(MAGIC, data[0..4].to_vec()));
        }
        if data.len() < 24 {
            return Err(CompError::truncated(4, 24 - data.len()));
        }
        let part_number = u32::from_le_bytes(data[4..8].try_into().unwrap());
        let total_parts = u32::from_le_bytes(data[8..12].try_into().unwrap());
        let payload_size = u32::from_le_bytes(data[12..16].try_into().unwrap());
        let total_archive_bytes = u64::from_le_bytes(data[16..24].try_into().unwrap());

        let (checksum, consumed) = read_checksum_record(&data[24..], part_number)?;
        Ok((
            PartHeader {
                part_number,
                total_parts,
                payload_size,
                total_archive_bytes,
                checksum,
            },
            24 + consumed,
        ))
    }
}

fn read_checksum_record(data: &[u8], part: u32) -> Result<(ChecksumRecord, usize)> {
    if data.len() < 4 {
        return Err(CompError::bad_part(part, "truncated checksum tag"));
    }
    let tag = u32::from_le_bytes(data[0..4].try_into().unwrap());
    let (record, payload_len) = match tag {
        0 => (ChecksumRecord::None, 0),
        1 => {
            let bytes = data
                .get(4..8)
                .ok_or_else(|| CompError::bad_part(part, "truncated crc32 checksum"))?;
            (
                ChecksumRecord::Crc32(u32::from_le_bytes(bytes.try_into().unwrap())),
                4,
            )
        }
        2 => {
            let bytes = data
                .get(4..20)
                .ok_or_else(|| CompError::bad_part(part, "truncated md5 checksum"))?;
            (ChecksumRecord::Md5(bytes.try_into().unwrap()), 16)
        }
        3 => {
            let bytes = data
                .get(4..36)
                .ok_or_else(|| CompError::bad_part(part, "truncated sha256 checksum"))?;
            (ChecksumRecord::Sha256(bytes.try_into().unwrap()), 32)
        }
        other => return Err(CompError::bad_part(part, format!("unknown checksum tag {other}"))),
    };
    Ok((record, 4 + payload_len))
}

/// Compress `input` with `codec`, then split the compressed stream into
/// parts no larger than `max_part_size` bytes of payload each.
pub fn write(
    input: &[u8],
    codec: &dyn Codec,
    max_part_size: usize,
    checksum_kind: ChecksumKind,
) -> Result<Vec<Vec<u8>>> {
    if max_part_size == 0 {
        return Err(CompError::invalid_argument("max_part_size must be nonzero"));
    }
    let compressed = codec.encode_buffer(input)?;
    let total_archive_bytes = compressed.len() as u64;

    let payload_chunks: Vec<&[u8]> = if compressed.is_empty() {
        vec![&compressed[0..0]]
    } else {
        compressed.chunks(max_part_size).collect()
    };
    let total_parts = payload_chunks.len() as u32;

    let mut parts = Vec::with_capacity(payload_chunks.len());
    for (i, payload) in payload_chunks.iter().enumerate() {
        let header = PartHeader {
            part_number: (i + 1) as u32,
            total_parts,
            payload_size: payload.len() as u32,
            total_archive_bytes,
            checksum: checksum::compute(checksum_kind, payload),
        };
        let mut part = Vec::new();
        header.write_to(&mut part);
        part.extend_from_slice(payload);
        parts.push(part);
    }
    Ok(parts)
}

/// Peek a part's header to learn its part number and how many parts the
/// whole archive has, without decoding anything. Lets a caller discover
/// `total_parts` from `basename.part0001` before it knows how many more
/// files to read.
pub fn peek_total_parts(part: &[u8]) -> Result<(u32, u32)> {
    let (header, _) = PartHeader::parse(part)?;
    Ok((header.part_number, header.total_parts))
}

/// Reassemble and decompress a split archive from its ordered parts.
/// `parts[0]` must be `basename.part0001`'s contents, and so on.
pub fn read(parts: &[Vec<u8>], codec: &dyn Codec) -> Result<Vec<u8>> {
    let Some(first) = parts.first() else {
        return Err(CompError::bad_part(1, "missing part"));
    };
    let (first_header, _) = PartHeader::parse(first)?;
    let total_parts = first_header.total_parts;

    if parts.len() != total_parts as usize {
        return Err(CompError::bad_part(
            parts.len() as u32 + 1,
            format!("expected {total_parts} parts, found {}", parts.len()),
        ));
    }

    let mut payload = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let part_number = (i + 1) as u32;
        let (header, consumed) = PartHeader::parse(part)?;
        if header.total_parts != total_parts {
            return Err(CompError::bad_part(
                part_number,
                "disagrees with part 1 on total_parts",
            ));
        }
        if header.part_number != part_number {
            return Err(CompError::bad_part(
                part_number,
                format!("header claims part {}", header.part_number),
            ));
        }
        let body = part
            .get(consumed..consumed + header.payload_size as usize)
            .ok_or_else(|| CompError::bad_part(part_number, "payload shorter than declared"))?;
        if !checksum::verify(body, &header.checksum) {
            return Err(CompError::bad_part(part_number, "checksum mismatch"));
        }
        payload.extend_from_slice(body);
    }

    if payload.len() as u64 != first_header.total_archive_bytes {
        return Err(CompError::corrupt_stream(
            "reassembled archive size does not match header",
        ));
    }
    codec.decode_buffer(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptk_rle::Rle;

    #[test]
    fn round_trips_across_several_parts() {
        let codec = Rle;
        let input = b"abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyz".to_vec();
        let parts = write(&input, &codec, 16, ChecksumKind::Crc32).unwrap();
        assert!(parts.len() > 1);
        let decoded = read(&parts, &codec).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn single_part_when_small() {
        let codec = Rle;
        let input = b"aaaa".to_vec();
        let parts = write(&input, &codec, 4096, ChecksumKind::None).unwrap();
        assert_eq!(parts.len(), 1);
        let decoded = read(&parts, &codec).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn missing_part_is_rejected() {
        let codec = Rle;
        let input = b"abcdefghijklmnopqrstuvwxyz".repeat(4);
        let mut parts = write(&input, &codec, 8, ChecksumKind::Crc32).unwrap();
        parts.remove(1);
        assert!(read(&parts, &codec).is_err());
    }

    #[test]
    fn corrupted_part_checksum_is_rejected() {
        let codec = Rle;
        let input = b"abcdefghijklmnopqrstuvwxyz".repeat(4);
        let mut parts = write(&input, &codec, 8, ChecksumKind::Crc32).unwrap();
        let last = parts[0].len() - 1;
        parts[0][last] ^= 0xFF;
        assert!(read(&parts, &codec).is_err());
    }

    #[test]
    fn peek_total_parts_matches_the_full_read() {
        let codec = Rle;
        let input = b"abcdefghijklmnopqrstuvwxyz".repeat(4);
        let parts = write(&input, &codec, 8, ChecksumKind::Crc32).unwrap();
        let (part_number, total_parts) = peek_total_parts(&parts[0]).unwrap();
        assert_eq!(part_number, 1);
        assert_eq!(total_parts as usize, parts.len());
    }

    #[test]
    fn bad_magic_on_first_part_is_rejected() {
        let codec = Rle;
        let parts = vec![b"NOTASPLTPART".to_vec()];
        assert!(read(&parts, &codec).is_err());
    }
}
