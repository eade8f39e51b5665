//! Provider interface and decoder error taxonomy
//!
//! Defines the `WaveDataProvider` trait consumed by the playback loop. Both
//! the fully materialized container provider and the streaming providers
//! implement it, so the caller never branches on the source format after
//! construction.

use super::formats::WaveFormat;

/// Error type for decoder operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Buffer ends before a required structure
    #[error("Truncated data: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Container or form signature mismatch
    #[error("Bad magic: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
    /// Format tag or sample encoding not handled
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Sub-format that cannot be resolved to a conversion
    #[error("Unsupported sub-format: {0}")]
    UnsupportedSubFormat(String),
    /// No payload chunk before the end of the container
    #[error("No data chunk found")]
    MissingPayload,
    /// Invalid or corrupted audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),
    /// Error reported by an external stream decoder
    #[error("Stream decoder error: {0}")]
    Stream(String),
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Wave data provider
///
/// Pull-based and single-threaded: the playback loop calls `stream` and
/// `seek` strictly sequentially. Fully materialized providers expose the
/// whole canonical buffer through `data` and treat `stream` as a no-op.
pub trait WaveDataProvider: Send {
    /// Returns the provider name (e.g., "Wave", "MPEG audio")
    fn name(&self) -> &'static str;

    /// Format of the canonical PCM returned by `data`
    fn format(&self) -> WaveFormat;

    /// Canonical PCM bytes currently available
    ///
    /// For streaming providers this is the window produced by the last
    /// `stream` call.
    fn data(&self) -> &[u8];

    /// Number of bytes returned by `data`
    fn data_size(&self) -> usize {
        self.data().len()
    }

    /// Decode up to `size` bytes of canonical PCM
    ///
    /// # Returns
    /// Number of bytes now available through `data`. Zero signals end of
    /// stream; fully materialized providers always return zero.
    fn stream(&mut self, size: usize) -> usize;

    /// Reposition to the nearest reachable point before `seconds`
    fn seek(&mut self, seconds: f32);

    /// Returns true if PCM is produced incrementally through `stream`
    fn is_streaming(&self) -> bool;

    /// Returns true if the provider has no audio at all
    fn is_empty(&self) -> bool {
        !self.is_streaming() && self.data_size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::UnsupportedFormat("tag 0x0011".to_string());
        assert_eq!(format!("{}", err), "Unsupported format: tag 0x0011");

        let err = DecodeError::MissingPayload;
        assert_eq!(format!("{}", err), "No data chunk found");

        let err = DecodeError::Truncated {
            offset: 36,
            needed: 8,
            available: 40,
        };
        assert_eq!(
            format!("{}", err),
            "Truncated data: need 8 bytes at offset 36, have 40"
        );
    }

    #[test]
    fn test_decode_error_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DecodeError>();
    }
}
