//! Ogg Vorbis streaming provider
//!
//! Uses the `lewton` crate for pure Rust Ogg Vorbis decoding.

use std::io::Cursor;

use bytes::Bytes;
use lewton::inside_ogg::OggStreamReader;
use lewton::{OggReadError, VorbisError};
use log::{debug, warn};

use super::decoder::{DecodeError, DecodeResult, WaveDataProvider};
use super::formats::WaveFormat;
use super::stream::StreamBuffer;

const PAGE_MAGIC: &[u8; 4] = b"OggS";

/// Minimum size of an Ogg page header
const PAGE_HEADER_SIZE: usize = 27;

/// Granule position of the last page that carries one
///
/// Scans backwards from the end of the stream; at most the last 64 KiB are
/// searched.
pub fn last_granule_position(data: &[u8]) -> Option<u64> {
    let search_start = data.len().saturating_sub(65536);
    let window = &data[search_start..];

    (0..window.len().saturating_sub(PAGE_HEADER_SIZE - 1))
        .rev()
        .filter(|&i| window[i..].starts_with(PAGE_MAGIC))
        .map(|i| {
            let mut granule = [0u8; 8];
            granule.copy_from_slice(&window[i + 6..i + 14]);
            u64::from_le_bytes(granule)
        })
        // -1: no packet finishes on this page
        .find(|&granule| granule != u64::MAX)
}

type Reader = OggStreamReader<Cursor<Bytes>>;

fn open_reader(source: &Bytes) -> DecodeResult<Reader> {
    OggStreamReader::new(Cursor::new(source.clone()))
        .map_err(|e| DecodeError::Stream(format!("Failed to open Ogg stream: {:?}", e)))
}

/// Damage confined to one page or packet
///
/// The page reader has already consumed the bad page and searches for the
/// next capture pattern on the following read.
fn is_recoverable(err: &VorbisError) -> bool {
    match err {
        VorbisError::BadAudio(_) => true,
        VorbisError::OggError(e) => matches!(
            e,
            OggReadError::HashMismatch(..)
                | OggReadError::NoCapturePatternFound
                | OggReadError::InvalidStreamStructVer(_)
                | OggReadError::InvalidData
        ),
        VorbisError::BadHeader(_) => false,
    }
}

/// Decode the next packet and append it to `out`
///
/// Corrupt pages and packets are skipped.
fn decode_packet(reader: &mut Reader, out: &mut Vec<u8>) -> DecodeResult<bool> {
    loop {
        match reader.read_dec_packet_itl() {
            Ok(Some(samples)) => {
                out.reserve(samples.len() * 2);
                for sample in samples {
                    out.extend_from_slice(&sample.to_le_bytes());
                }
                return Ok(true);
            }
            Ok(None) => return Ok(false),
            Err(e) if is_recoverable(&e) => {
                warn!("Skipping corrupt Ogg data: {:?}", e);
            }
            Err(e) => {
                return Err(DecodeError::Stream(format!("Ogg decode error: {:?}", e)));
            }
        }
    }
}

/// Streaming Ogg Vorbis provider
pub struct OggDataProvider {
    /// Retained stream, reopened on rewind
    source: Bytes,
    reader: Reader,
    format: WaveFormat,
    /// Last granule position in the stream, 0 when unknown
    total_pcm: u64,
    pcm: StreamBuffer,
}

impl OggDataProvider {
    /// Open a stream held in memory
    pub fn new(source: Bytes) -> DecodeResult<Self> {
        let reader = open_reader(&source)?;
        let sample_rate = reader.ident_hdr.audio_sample_rate;
        let channels = reader.ident_hdr.audio_channels as u16;
        let total_pcm = last_granule_position(&source).unwrap_or(0);

        debug!(
            "Ogg Vorbis: channels = {}, samples/s = {}, length = {} samples",
            channels, sample_rate, total_pcm
        );

        Ok(Self {
            source,
            reader,
            format: WaveFormat::pcm16(channels, sample_rate),
            total_pcm,
            pcm: StreamBuffer::default(),
        })
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.pcm = StreamBuffer::with_capacity(capacity);
        self
    }

    /// Total length in seconds, when the stream declares it
    pub fn duration_seconds(&self) -> Option<f32> {
        if self.total_pcm == 0 || self.format.sample_rate == 0 {
            return None;
        }
        Some(self.total_pcm as f32 / self.format.sample_rate as f32)
    }
}

impl WaveDataProvider for OggDataProvider {
    fn name(&self) -> &'static str {
        "Ogg Vorbis"
    }

    fn format(&self) -> WaveFormat {
        self.format
    }

    fn data(&self) -> &[u8] {
        self.pcm.data()
    }

    fn stream(&mut self, size: usize) -> usize {
        let reader = &mut self.reader;
        self.pcm.pull(size, |out| decode_packet(reader, out))
    }

    fn seek(&mut self, seconds: f32) {
        self.pcm.reset();

        if seconds.is_nan() || seconds <= 0.0 {
            match open_reader(&self.source) {
                Ok(reader) => self.reader = reader,
                Err(e) => {
                    warn!("Ogg rewind failed: {}", e);
                    self.pcm.finish();
                }
            }
            return;
        }

        let target = (seconds as f64 * self.format.sample_rate as f64) as u64;
        if self.total_pcm > 0 && target >= self.total_pcm {
            debug!("Seek to {}s is past the end of the stream", seconds);
            self.pcm.finish();
            return;
        }

        if let Err(e) = self.reader.seek_absgp_pg(target) {
            debug!("Seek to {}s failed: {:?}", seconds, e);
            self.pcm.finish();
        }
    }

    fn is_streaming(&self) -> bool {
        true
    }
}
