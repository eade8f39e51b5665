//! WAV container provider
//!
//! Parses a RIFF WAVE container held in memory and materializes the whole
//! payload as canonical 16-bit PCM. Supports:
//! - 8, 16, 24 and 32-bit integer PCM
//! - 32 and 64-bit IEEE float
//! - WAVE_FORMAT_EXTENSIBLE resolving to PCM or float
//! - Microsoft ADPCM
//!
//! Malformed input never fails construction: the provider degrades to an
//! empty payload and the problem is logged.

use bytes::Bytes;
use log::{debug, error};

use super::convert::{self, SampleEncoding};
use super::decoder::{DecodeError, DecodeResult, WaveDataProvider};
use super::formats::WaveFormat;
use super::msadpcm;
use super::riff::{self, FormatTag, WavHeader, HEADER_SIZE};

/// How the payload is turned into canonical PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Samples(SampleEncoding),
    MsAdpcm,
}

/// Resolve the format tag (and sub-format for extensible headers)
fn classify(header: &WavHeader, data: &[u8]) -> DecodeResult<Payload> {
    let tag = match header.format_tag {
        FormatTag::Extensible => {
            let sub = header.sub_format(data)?;
            match sub {
                FormatTag::Pcm | FormatTag::IeeeFloat => sub,
                other => {
                    return Err(DecodeError::UnsupportedSubFormat(format!(
                        "extensible sub-format 0x{:04x}",
                        other.code()
                    )))
                }
            }
        }
        tag => tag,
    };

    match tag {
        FormatTag::Pcm => SampleEncoding::from_int_bits(header.bits_per_sample)
            .map(Payload::Samples)
            .ok_or_else(|| {
                DecodeError::UnsupportedFormat(format!(
                    "{}-bit integer PCM",
                    header.bits_per_sample
                ))
            }),
        FormatTag::IeeeFloat => SampleEncoding::from_float_bits(header.bits_per_sample)
            .map(Payload::Samples)
            .ok_or_else(|| {
                DecodeError::UnsupportedSubFormat(format!(
                    "Unknown float format in WAV: {} bits",
                    header.bits_per_sample
                ))
            }),
        FormatTag::MsAdpcm => Ok(Payload::MsAdpcm),
        other => Err(DecodeError::UnsupportedFormat(format!(
            "format tag 0x{:04x}",
            other.code()
        ))),
    }
}

/// Read the fixed header and check the RIFF/WAVE signatures
fn read_header(data: &[u8]) -> DecodeResult<WavHeader> {
    let header = WavHeader::parse(data)?;
    header.check_magic()?;

    debug!("Channels       : {}", header.channels);
    debug!("Sample rate    : {}", header.sample_rate);
    debug!("Bits per sample: {}", header.bits_per_sample);
    debug!("Format tag     : {:x}", header.format_tag.code());

    Ok(header)
}

/// Locate and convert the payload described by `header`
///
/// 16-bit PCM payloads are returned as a view into `data`; every other
/// encoding is converted into a new buffer.
fn decode_payload(header: &WavHeader, data: &Bytes) -> DecodeResult<Bytes> {
    let payload_kind = classify(header, data)?;
    let chunk = riff::find_data_chunk(data, header.chunks_offset())?;
    let raw = chunk.payload(data);

    let pcm = match payload_kind {
        Payload::Samples(encoding) if encoding.is_canonical() => {
            let start = chunk.payload_offset();
            data.slice(start..start + raw.len())
        }
        Payload::Samples(encoding) => Bytes::from(convert::convert(encoding, raw)),
        Payload::MsAdpcm => Bytes::from(msadpcm::decode(
            raw,
            header.block_align as usize,
            header.channels,
        )?),
    };

    debug!(
        "PCM WAVE: channels = {}, samples/s = {}, bits/sample = {}, data size = {}",
        header.channels,
        header.sample_rate,
        header.bits_per_sample,
        pcm.len()
    );

    Ok(pcm)
}

/// Extract an MPEG Layer III bitstream wrapped in a WAVE container
///
/// Returns everything following the fixed header, unmodified, when the
/// container's format tag is 0x0055.
pub fn extract_embedded_mp3(data: &Bytes) -> Option<Bytes> {
    let header = WavHeader::parse(data).ok()?;
    header.check_magic().ok()?;
    if header.format_tag != FormatTag::MpegLayer3 {
        return None;
    }
    Some(data.slice(HEADER_SIZE..))
}

/// Fully materialized WAV provider
#[derive(Debug, Clone)]
pub struct WavDataProvider {
    /// Canonical output format
    format: WaveFormat,
    /// Canonical PCM payload
    data: Bytes,
}

impl WavDataProvider {
    /// Parse `data` into a provider
    ///
    /// Unsupported or malformed input yields a provider with an empty
    /// payload. Once the header has been read its channel count and rate
    /// are still reported.
    pub fn new(data: Bytes) -> Self {
        let header = match read_header(&data) {
            Ok(header) => header,
            Err(e) => {
                error!("Unsupported WAV file: {}", e);
                return Self {
                    format: WaveFormat::default(),
                    data: Bytes::new(),
                };
            }
        };

        let format = WaveFormat::pcm16(header.channels, header.sample_rate);
        match decode_payload(&header, &data) {
            Ok(data) => Self { format, data },
            Err(e) => {
                error!("Unsupported WAV file: {}", e);
                Self {
                    format,
                    data: Bytes::new(),
                }
            }
        }
    }

    /// Total length in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.format.duration_of(self.data.len())
    }
}

impl WaveDataProvider for WavDataProvider {
    fn name(&self) -> &'static str {
        "Wave"
    }

    fn format(&self) -> WaveFormat {
        self.format
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn stream(&mut self, _size: usize) -> usize {
        0
    }

    fn seek(&mut self, _seconds: f32) {}

    fn is_streaming(&self) -> bool {
        false
    }
}
