//! MPEG audio streaming provider
//!
//! Decodes an in-memory MPEG Layer III bitstream frame by frame with
//! `symphonia` and hands out canonical 16-bit PCM on demand. Corrupt frames
//! are skipped. Seeking is coarse: resolution is bounded by the frame size.

use std::io::{Cursor, ErrorKind};

use bytes::Bytes;
use log::{debug, warn};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;

use super::decoder::{DecodeError, DecodeResult, WaveDataProvider};
use super::formats::WaveFormat;
use super::stream::StreamBuffer;

fn stream_error(e: SymphoniaError) -> DecodeError {
    DecodeError::Stream(e.to_string())
}

/// Open demuxer and frame decoder over the whole bitstream
struct Mp3Stream {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: WaveFormat,
    /// Total sample frames, when the stream declares it
    n_frames: Option<u64>,
    /// Sample frame of the next decoded sample
    stream_position: u64,
    samples: Option<(SignalSpec, SampleBuffer<i16>)>,
}

impl Mp3Stream {
    fn open(source: &Bytes) -> DecodeResult<Self> {
        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(source.clone())),
            Default::default(),
        );
        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(stream_error)?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::Stream("no decodable audio track".to_string()))?;

        let params = &track.codec_params;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| DecodeError::Stream("missing sample rate".to_string()))?;
        let channels = params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| DecodeError::Stream("missing channel layout".to_string()))?;
        let track_id = track.id;
        let n_frames = params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(stream_error)?;

        Ok(Self {
            reader,
            decoder,
            track_id,
            format: WaveFormat::pcm16(channels, sample_rate),
            n_frames,
            stream_position: 0,
            samples: None,
        })
    }

    /// Decode the next good frame and append it to `out`
    fn decode_frame(&mut self, out: &mut Vec<u8>) -> DecodeResult<bool> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    debug!("MPEG stream exhausted at frame {}", self.stream_position);
                    return Ok(false);
                }
                Err(e) => return Err(stream_error(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt MPEG frame: {}", e);
                    continue;
                }
                Err(SymphoniaError::IoError(e)) => {
                    warn!("Skipping unreadable MPEG frame: {}", e);
                    continue;
                }
                Err(e) => return Err(stream_error(e)),
            };

            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let needed = decoded.capacity() * spec.channels.count();
            let reusable = matches!(
                &self.samples,
                Some((cached, buf)) if *cached == spec && buf.capacity() >= needed
            );
            if !reusable {
                let buf = SampleBuffer::new(decoded.capacity() as u64, spec);
                self.samples = Some((spec, buf));
            }

            if let Some((_, buf)) = self.samples.as_mut() {
                buf.copy_interleaved_ref(decoded);
                out.reserve(buf.len() * 2);
                for sample in buf.samples() {
                    out.extend_from_slice(&sample.to_le_bytes());
                }
            }

            self.stream_position += frames as u64;
            return Ok(true);
        }
    }

    fn duration_seconds(&self) -> Option<f32> {
        let rate = self.format.sample_rate;
        self.n_frames
            .filter(|_| rate > 0)
            .map(|n| n as f32 / rate as f32)
    }
}

/// Streaming MPEG audio provider
pub struct Mp3DataProvider {
    /// Retained bitstream, reopened on rewind
    source: Bytes,
    stream: Mp3Stream,
    pcm: StreamBuffer,
}

impl Mp3DataProvider {
    /// Open a bitstream held in memory
    ///
    /// Fails when no MPEG frame can be found or the stream header lacks a
    /// sample rate or channel layout.
    pub fn new(source: Bytes) -> DecodeResult<Self> {
        let stream = Mp3Stream::open(&source)?;

        debug!(
            "MPEG audio: channels = {}, samples/s = {}, frames = {:?}",
            stream.format.channels, stream.format.sample_rate, stream.n_frames
        );

        Ok(Self {
            source,
            stream,
            pcm: StreamBuffer::default(),
        })
    }

    /// Reserve room for `capacity` bytes of decoded PCM up front
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.pcm = StreamBuffer::with_capacity(capacity);
        self
    }

    /// Total length in seconds, when the stream declares it
    pub fn duration_seconds(&self) -> Option<f32> {
        self.stream.duration_seconds()
    }

    /// Sample frame of the next decoded sample
    pub fn stream_position(&self) -> u64 {
        self.stream.stream_position
    }

    fn rewind(&mut self) -> DecodeResult<()> {
        self.stream = Mp3Stream::open(&self.source)?;
        Ok(())
    }
}

impl WaveDataProvider for Mp3DataProvider {
    fn name(&self) -> &'static str {
        "MPEG audio"
    }

    fn format(&self) -> WaveFormat {
        self.stream.format
    }

    fn data(&self) -> &[u8] {
        self.pcm.data()
    }

    fn stream(&mut self, size: usize) -> usize {
        let stream = &mut self.stream;
        self.pcm.pull(size, |out| stream.decode_frame(out))
    }

    fn seek(&mut self, seconds: f32) {
        self.pcm.reset();

        if seconds.is_nan() || seconds <= 0.0 {
            if let Err(e) = self.rewind() {
                warn!("MPEG rewind failed: {}", e);
                self.pcm.finish();
            }
            return;
        }

        if matches!(self.duration_seconds(), Some(total) if seconds >= total) {
            debug!("Seek to {}s is past the end of the stream", seconds);
            self.pcm.finish();
            return;
        }

        let to = SeekTo::Time {
            time: Time::from(seconds as f64),
            track_id: Some(self.stream.track_id),
        };
        match self.stream.reader.seek(SeekMode::Coarse, to) {
            Ok(seeked) => {
                self.stream.decoder.reset();
                self.stream.stream_position = seeked.actual_ts;
                debug!("Seeked to frame {}", seeked.actual_ts);
            }
            Err(e) => {
                debug!("Seek to {}s failed: {}", seconds, e);
                self.pcm.finish();
            }
        }
    }

    fn is_streaming(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// MPEG-1 Layer III, 128 kbit/s, 44100 Hz, mono, no CRC
    pub(crate) const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC0];
    pub(crate) const FRAME_LEN: usize = 417;
    pub(crate) const SAMPLES_PER_FRAME: usize = 1152;

    /// A run of silent frames: zeroed side info and main data
    pub(crate) fn silent_frames(count: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(count * FRAME_LEN);
        for _ in 0..count {
            out.extend_from_slice(&FRAME_HEADER);
            out.extend(std::iter::repeat(0u8).take(FRAME_LEN - FRAME_HEADER.len()));
        }
        out
    }

    fn drain(provider: &mut Mp3DataProvider, chunk: usize) -> usize {
        let mut total = 0;
        loop {
            let n = provider.stream(chunk);
            if n == 0 {
                return total;
            }
            assert_eq!(provider.data_size(), n);
            total += n;
        }
    }

    #[test]
    fn test_format_known_after_construction() {
        let provider = Mp3DataProvider::new(Bytes::from(silent_frames(20))).unwrap();
        assert_eq!(provider.format(), WaveFormat::pcm16(1, 44100));
        assert!(provider.is_streaming());
        assert!(!provider.is_empty());
        assert_eq!(provider.name(), "MPEG audio");
        // nothing decoded yet
        assert_eq!(provider.data_size(), 0);
    }

    #[test]
    fn test_pull_never_exceeds_request() {
        let mut provider = Mp3DataProvider::new(Bytes::from(silent_frames(20))).unwrap();
        let n = provider.stream(1000);
        assert_eq!(n, 1000);
        assert!(provider.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_drain_to_end_of_stream() {
        let mut provider = Mp3DataProvider::new(Bytes::from(silent_frames(20))).unwrap();
        let total = drain(&mut provider, 4096);
        assert!(total > 0);
        assert_eq!(total % 2, 0);
        assert!(total <= 20 * SAMPLES_PER_FRAME * 2);
        // sticky
        assert_eq!(provider.stream(4096), 0);
        assert_eq!(provider.stream(4096), 0);
    }

    #[test]
    fn test_seek_to_start_clears_end_of_stream() {
        let mut provider = Mp3DataProvider::new(Bytes::from(silent_frames(20))).unwrap();
        let first = drain(&mut provider, 8192);
        assert_eq!(provider.stream(8192), 0);

        provider.seek(0.0);
        assert_eq!(provider.stream_position(), 0);
        assert!(provider.stream(8192) > 0);
        let second = provider.data_size() + drain(&mut provider, 8192);
        assert_eq!(first, second);
    }

    #[test]
    fn test_seek_past_end() {
        let mut provider = Mp3DataProvider::new(Bytes::from(silent_frames(20))).unwrap();
        provider.seek(3600.0);
        assert_eq!(provider.stream(4096), 0);
        assert_eq!(provider.data_size(), 0);

        provider.seek(0.0);
        assert!(provider.stream(4096) > 0);
    }

    #[test]
    fn test_seek_within_stream() {
        let mut provider = Mp3DataProvider::new(Bytes::from(silent_frames(40))).unwrap();
        provider.seek(0.3);
        let rest = drain(&mut provider, 4096);
        assert!(rest > 0);
        assert!(rest < 40 * SAMPLES_PER_FRAME * 2);
    }

    #[test]
    fn test_corrupt_frame_skipped() {
        let mut data = silent_frames(10);
        // garbage between two frames
        let mid = 5 * FRAME_LEN;
        let tail = data.split_off(mid);
        data.extend_from_slice(&[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x00, 0x11]);
        data.extend_from_slice(&tail);

        let mut provider = Mp3DataProvider::new(Bytes::from(data)).unwrap();
        assert!(drain(&mut provider, 4096) > 0);
    }

    #[test]
    fn test_leading_junk_tolerated() {
        let mut data = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        data.extend(silent_frames(10));
        let mut provider = Mp3DataProvider::new(Bytes::from(data)).unwrap();
        assert_eq!(provider.format().sample_rate, 44100);
        assert!(drain(&mut provider, 4096) > 0);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Mp3DataProvider::new(Bytes::from_static(b"definitely not mpeg audio")).is_err());
        assert!(Mp3DataProvider::new(Bytes::new()).is_err());
    }

    #[test]
    fn test_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Mp3DataProvider>();
    }
}
