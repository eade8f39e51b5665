//! RIFF/WAVE structural views
//!
//! Bounds-checked little-endian field readers over an in-memory container,
//! the fixed header layout (RIFF header followed by a WAVEFORMATEX body) and
//! the chunk walk that locates the payload chunk.
//!
//! ```text
//!  0  "RIFF"            20  format tag          34  bits per sample
//!  4  file size         22  channels            36  extra param size
//!  8  "WAVE"            24  sample rate         38  (end of fixed header)
//! 12  "fmt "            28  avg bytes/second
//! 16  fmt chunk size    32  block align
//! ```

use log::debug;

use super::decoder::{DecodeError, DecodeResult};

pub const RIFF_MAGIC: [u8; 4] = *b"RIFF";
pub const WAVE_MAGIC: [u8; 4] = *b"WAVE";
pub const DATA_ID: [u8; 4] = *b"data";
pub const FACT_ID: [u8; 4] = *b"fact";
pub const LIST_ID: [u8; 4] = *b"LIST";

/// Size of the fixed header including the extra-parameter size field
pub const HEADER_SIZE: usize = 38;

/// Size of the extra-parameter size field that plain PCM headers omit
pub const EXTRA_SIZE_FIELD: usize = 2;

/// Size of a chunk header (id + size)
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Offset of the sub-format tag relative to the end of the fixed header
pub const SUB_FORMAT_OFFSET: usize = 6;

fn field(data: &[u8], offset: usize, len: usize) -> DecodeResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(DecodeError::Truncated {
            offset,
            needed: len,
            available: data.len(),
        })
}

/// Read a little-endian u16 at `offset`
pub fn read_u16_le(data: &[u8], offset: usize) -> DecodeResult<u16> {
    let b = field(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Read a little-endian i16 at `offset`
pub fn read_i16_le(data: &[u8], offset: usize) -> DecodeResult<i16> {
    read_u16_le(data, offset).map(|v| v as i16)
}

/// Read a little-endian u32 at `offset`
pub fn read_u32_le(data: &[u8], offset: usize) -> DecodeResult<u32> {
    let b = field(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a four character code at `offset`
pub fn read_tag(data: &[u8], offset: usize) -> DecodeResult<[u8; 4]> {
    let b = field(data, offset, 4)?;
    Ok([b[0], b[1], b[2], b[3]])
}

/// WAVE format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// 0x0001
    Pcm,
    /// 0x0002, Microsoft ADPCM
    MsAdpcm,
    /// 0x0003
    IeeeFloat,
    /// 0x0055, MPEG Layer III bitstream
    MpegLayer3,
    /// 0xFFFE, real encoding stored in the sub-format field
    Extensible,
    /// Anything else
    Unknown(u16),
}

impl FormatTag {
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0001 => FormatTag::Pcm,
            0x0002 => FormatTag::MsAdpcm,
            0x0003 => FormatTag::IeeeFloat,
            0x0055 => FormatTag::MpegLayer3,
            0xFFFE => FormatTag::Extensible,
            other => FormatTag::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            FormatTag::Pcm => 0x0001,
            FormatTag::MsAdpcm => 0x0002,
            FormatTag::IeeeFloat => 0x0003,
            FormatTag::MpegLayer3 => 0x0055,
            FormatTag::Extensible => 0xFFFE,
            FormatTag::Unknown(code) => *code,
        }
    }
}

/// Fixed container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff: [u8; 4],
    pub file_size: u32,
    pub wave: [u8; 4],
    pub fmt: [u8; 4],
    pub fmt_size: u32,
    pub format_tag: FormatTag,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Size of the format-specific extra parameters
    pub extra_size: u16,
}

impl WavHeader {
    /// Parse the fixed header from the start of `data`
    ///
    /// Only checks that the buffer is long enough; signatures are checked
    /// by `check_magic`.
    pub fn parse(data: &[u8]) -> DecodeResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            riff: read_tag(data, 0)?,
            file_size: read_u32_le(data, 4)?,
            wave: read_tag(data, 8)?,
            fmt: read_tag(data, 12)?,
            fmt_size: read_u32_le(data, 16)?,
            format_tag: FormatTag::from_code(read_u16_le(data, 20)?),
            channels: read_u16_le(data, 22)?,
            sample_rate: read_u32_le(data, 24)?,
            avg_bytes_per_sec: read_u32_le(data, 28)?,
            block_align: read_u16_le(data, 32)?,
            bits_per_sample: read_u16_le(data, 34)?,
            extra_size: read_u16_le(data, 36)?,
        })
    }

    /// Verify the container and form signatures
    pub fn check_magic(&self) -> DecodeResult<()> {
        if self.riff != RIFF_MAGIC {
            return Err(DecodeError::BadMagic {
                expected: RIFF_MAGIC,
                found: self.riff,
            });
        }
        if self.wave != WAVE_MAGIC {
            return Err(DecodeError::BadMagic {
                expected: WAVE_MAGIC,
                found: self.wave,
            });
        }
        Ok(())
    }

    /// Offset of the first chunk after the format description
    ///
    /// Plain PCM headers carry no extra-parameter size field, so the walk
    /// starts two bytes earlier for them.
    pub fn chunks_offset(&self) -> usize {
        match self.format_tag {
            FormatTag::Pcm => HEADER_SIZE - EXTRA_SIZE_FIELD,
            _ => HEADER_SIZE + self.extra_size as usize,
        }
    }

    /// Read the sub-format tag of an extensible header
    pub fn sub_format(&self, data: &[u8]) -> DecodeResult<FormatTag> {
        read_u16_le(data, HEADER_SIZE + SUB_FORMAT_OFFSET).map(FormatTag::from_code)
    }
}

/// Chunk header located inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: [u8; 4],
    pub size: u32,
    /// Offset of the chunk header itself
    pub offset: usize,
}

impl ChunkHeader {
    /// Read the chunk header at `offset`
    pub fn read(data: &[u8], offset: usize) -> DecodeResult<Self> {
        Ok(Self {
            id: read_tag(data, offset)?,
            size: read_u32_le(data, offset + 4)?,
            offset,
        })
    }

    /// Offset of the first payload byte
    pub fn payload_offset(&self) -> usize {
        self.offset + CHUNK_HEADER_SIZE
    }

    /// Offset just past the declared payload
    pub fn end_offset(&self) -> usize {
        self.payload_offset().saturating_add(self.size as usize)
    }

    /// Payload bytes, clamped to what is actually present in `data`
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        let start = self.payload_offset().min(data.len());
        let end = self.end_offset().min(data.len());
        &data[start..end]
    }

    fn is_skippable(&self) -> bool {
        self.id == FACT_ID || self.id == LIST_ID
    }
}

/// Walk chunk headers from `offset` until the payload chunk is found
///
/// Any number of "fact" and "LIST" chunks are skipped in any order. An
/// unrecognized chunk id, or a chunk header that does not fit in the
/// buffer, ends the walk with `MissingPayload`.
pub fn find_data_chunk(data: &[u8], mut offset: usize) -> DecodeResult<ChunkHeader> {
    loop {
        let chunk = match ChunkHeader::read(data, offset) {
            Ok(chunk) => chunk,
            Err(_) => {
                debug!("Chunk walk ran off the end of the container at {}", offset);
                return Err(DecodeError::MissingPayload);
            }
        };

        if chunk.id == DATA_ID {
            return Ok(chunk);
        }

        if !chunk.is_skippable() {
            debug!(
                "Unrecognized chunk {:?} at offset {}",
                String::from_utf8_lossy(&chunk.id),
                offset
            );
            return Err(DecodeError::MissingPayload);
        }

        offset = chunk.end_offset();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a container header for tests
    pub(crate) fn header_bytes(
        tag: u16,
        channels: u16,
        sample_rate: u32,
        block_align: u16,
        bits: u16,
        extra_size: u16,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        let fmt_size: u32 = if tag == 1 { 16 } else { 18 + extra_size as u32 };
        out.extend_from_slice(&fmt_size.to_le_bytes());
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        let avg = sample_rate * block_align as u32;
        out.extend_from_slice(&avg.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        if tag != 1 {
            out.extend_from_slice(&extra_size.to_le_bytes());
        }
        out
    }

    pub(crate) fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(CHUNK_HEADER_SIZE + payload.len());
        out.extend_from_slice(id);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_readers_check_bounds() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 0x0201);
        assert_eq!(read_u16_le(&data, 1).unwrap(), 0x0302);
        assert!(matches!(
            read_u16_le(&data, 2),
            Err(DecodeError::Truncated { offset: 2, needed: 2, available: 3 })
        ));
        assert!(read_u32_le(&data, 0).is_err());
        assert!(read_tag(&data, usize::MAX).is_err());
    }

    #[test]
    fn test_read_i16_sign() {
        assert_eq!(read_i16_le(&[0xFF, 0xFF], 0).unwrap(), -1);
        assert_eq!(read_i16_le(&[0x00, 0x80], 0).unwrap(), i16::MIN);
    }

    #[test]
    fn test_format_tag_codes() {
        for code in [0x0001u16, 0x0002, 0x0003, 0x0055, 0xFFFE, 0x0011] {
            assert_eq!(FormatTag::from_code(code).code(), code);
        }
        assert_eq!(FormatTag::from_code(0x0011), FormatTag::Unknown(0x0011));
    }

    #[test]
    fn test_parse_header_fields() {
        let data = header_bytes(3, 2, 48000, 8, 32, 0);
        let header = WavHeader::parse(&data).unwrap();
        header.check_magic().unwrap();
        assert_eq!(header.format_tag, FormatTag::IeeeFloat);
        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 48000);
        assert_eq!(header.block_align, 8);
        assert_eq!(header.bits_per_sample, 32);
        assert_eq!(header.chunks_offset(), HEADER_SIZE);
    }

    #[test]
    fn test_parse_header_too_short() {
        let data = vec![0u8; HEADER_SIZE - 1];
        assert!(matches!(
            WavHeader::parse(&data),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = header_bytes(1, 1, 8000, 2, 16, 0);
        data.extend_from_slice(&[0, 0]);
        data[8..12].copy_from_slice(b"AVI ");
        let header = WavHeader::parse(&data).unwrap();
        assert!(matches!(
            header.check_magic(),
            Err(DecodeError::BadMagic { expected, .. }) if expected == WAVE_MAGIC
        ));
    }

    #[test]
    fn test_pcm_chunks_offset_backs_off() {
        let mut data = header_bytes(1, 1, 8000, 2, 16, 0);
        data.extend(chunk(b"data", &[1, 2]));
        let header = WavHeader::parse(&data).unwrap();
        assert_eq!(header.chunks_offset(), 36);
        let found = find_data_chunk(&data, header.chunks_offset()).unwrap();
        assert_eq!(found.payload(&data), &[1, 2]);
    }

    #[test]
    fn test_find_data_skips_metadata() {
        let mut data = Vec::new();
        data.extend(chunk(b"LIST", b"INFOISFT"));
        data.extend(chunk(b"fact", &[0, 1, 0, 0]));
        data.extend(chunk(b"LIST", &[]));
        data.extend(chunk(b"data", &[9, 8, 7]));
        let found = find_data_chunk(&data, 0).unwrap();
        assert_eq!(found.size, 3);
        assert_eq!(found.payload(&data), &[9, 8, 7]);
    }

    #[test]
    fn test_find_data_unknown_chunk_stops() {
        let mut data = Vec::new();
        data.extend(chunk(b"junk", &[0; 4]));
        data.extend(chunk(b"data", &[1]));
        assert_eq!(find_data_chunk(&data, 0), Err(DecodeError::MissingPayload));
    }

    #[test]
    fn test_find_data_oversized_chunk_terminates() {
        let mut data = Vec::new();
        data.extend_from_slice(b"LIST");
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend(chunk(b"data", &[1]));
        assert_eq!(find_data_chunk(&data, 0), Err(DecodeError::MissingPayload));
    }

    #[test]
    fn test_payload_clamped_to_buffer() {
        let mut data = Vec::new();
        data.extend_from_slice(b"data");
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        let found = find_data_chunk(&data, 0).unwrap();
        assert_eq!(found.payload(&data), &[1, 2, 3]);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn data_found_after_any_metadata_sequence(
                chunks in proptest::collection::vec(
                    (any::<bool>(), proptest::collection::vec(any::<u8>(), 0..32)),
                    0..12,
                ),
                payload in proptest::collection::vec(any::<u8>(), 0..64),
            ) {
                let mut data = Vec::new();
                for (is_list, body) in &chunks {
                    let id = if *is_list { b"LIST" } else { b"fact" };
                    data.extend(chunk(id, body));
                }
                data.extend(chunk(b"data", &payload));
                let found = find_data_chunk(&data, 0).unwrap();
                prop_assert_eq!(found.payload(&data), payload.as_slice());
            }

            #[test]
            fn walk_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
                let _ = find_data_chunk(&data, 0);
            }
        }
    }
}
