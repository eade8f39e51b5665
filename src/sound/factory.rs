//! Provider selection
//!
//! Inspects the start of a byte buffer once and picks the provider that
//! will serve it. Callers only see `WaveDataProvider` afterwards.

use std::path::Path;

use bytes::Bytes;
use log::{debug, error};

use super::decoder::{DecodeResult, WaveDataProvider};
use super::mp3::Mp3DataProvider;
use super::null::NullProvider;
use super::ogg::OggDataProvider;
use super::riff::{FormatTag, WavHeader, RIFF_MAGIC, WAVE_MAGIC};
use super::wav::{self, WavDataProvider};
use crate::config::Options;

/// Source kind detected from content or file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// RIFF/WAVE with PCM, float or ADPCM payload
    Wave,
    /// RIFF/WAVE wrapping an MPEG Layer III bitstream
    EmbeddedMp3,
    Ogg,
    Mp3,
    Unknown,
}

fn is_riff_wave(data: &[u8]) -> bool {
    data.len() >= 12 && data[0..4] == RIFF_MAGIC && data[8..12] == WAVE_MAGIC
}

fn is_mpeg_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0
}

fn kind_from_extension(name: &str) -> SourceKind {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") | Some("wave") => SourceKind::Wave,
        Some("mp3") | Some("mp2") => SourceKind::Mp3,
        Some("ogg") | Some("oga") => SourceKind::Ogg,
        _ => SourceKind::Unknown,
    }
}

/// Detect the source kind, content first, file name as fallback
pub fn sniff(name: &str, data: &[u8]) -> SourceKind {
    if is_riff_wave(data) {
        let embedded = WavHeader::parse(data)
            .map(|h| h.format_tag == FormatTag::MpegLayer3)
            .unwrap_or(false);
        return if embedded {
            SourceKind::EmbeddedMp3
        } else {
            SourceKind::Wave
        };
    }
    if data.starts_with(b"OggS") {
        return SourceKind::Ogg;
    }
    if data.starts_with(b"ID3") || is_mpeg_sync(data) {
        return SourceKind::Mp3;
    }
    kind_from_extension(name)
}

fn streaming<P>(name: &str, result: DecodeResult<P>) -> Box<dyn WaveDataProvider>
where
    P: WaveDataProvider + 'static,
{
    match result {
        Ok(provider) => Box::new(provider),
        Err(e) => {
            error!("{}: {}", name, e);
            Box::new(NullProvider::new())
        }
    }
}

/// Build the provider for `data`
///
/// `name` is only used for the extension fallback and diagnostics. Input
/// that no provider accepts yields a `NullProvider`.
pub fn create_provider(name: &str, data: Bytes, options: &Options) -> Box<dyn WaveDataProvider> {
    let kind = sniff(name, &data);
    debug!("{}: detected {:?}", name, kind);

    let chunk = options.stream_chunk_bytes;
    match kind {
        SourceKind::Wave => Box::new(WavDataProvider::new(data)),
        SourceKind::EmbeddedMp3 => match wav::extract_embedded_mp3(&data) {
            Some(bitstream) => streaming(
                name,
                Mp3DataProvider::new(bitstream).map(|p| p.with_buffer_capacity(chunk)),
            ),
            None => Box::new(NullProvider::new()),
        },
        SourceKind::Mp3 => streaming(
            name,
            Mp3DataProvider::new(data).map(|p| p.with_buffer_capacity(chunk)),
        ),
        SourceKind::Ogg => streaming(
            name,
            OggDataProvider::new(data).map(|p| p.with_buffer_capacity(chunk)),
        ),
        SourceKind::Unknown => {
            error!("{}: unrecognized audio format", name);
            Box::new(NullProvider::new())
        }
    }
}
