//! Wave format descriptor shared by all providers
//!
//! Describes the canonical PCM stream handed to the playback backend.

/// Bit depth of every canonical PCM stream.
pub const CANONICAL_BITS_PER_SAMPLE: u16 = 16;

/// Canonical stream format
///
/// Immutable once a provider has been constructed. After any conversion
/// path completes `bits_per_sample` is 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaveFormat {
    /// Number of interleaved channels
    pub channels: u16,
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
}

impl WaveFormat {
    /// Create a canonical 16-bit format
    pub fn pcm16(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: CANONICAL_BITS_PER_SAMPLE,
        }
    }

    /// Returns the number of bytes per sample frame (all channels)
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Returns the number of bytes per second of audio
    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// Duration in seconds of `bytes` of audio in this format
    pub fn duration_of(&self, bytes: usize) -> f32 {
        let rate = self.bytes_per_second();
        if rate == 0 {
            0.0
        } else {
            bytes as f32 / rate as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_is_canonical() {
        let format = WaveFormat::pcm16(2, 44100);
        assert_eq!(format.bits_per_sample, CANONICAL_BITS_PER_SAMPLE);
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.bytes_per_second(), 176400);
    }

    #[test]
    fn test_default_is_empty() {
        let format = WaveFormat::default();
        assert_eq!(format.channels, 0);
        assert_eq!(format.bytes_per_frame(), 0);
        assert_eq!(format.duration_of(1024), 0.0);
    }

    #[test]
    fn test_duration_of() {
        let format = WaveFormat::pcm16(1, 8000);
        assert_eq!(format.duration_of(16000), 1.0);
    }
}
