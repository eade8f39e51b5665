//! Null provider
//!
//! Stands in for input that no provider understands so the playback loop
//! can move on to the next queued item.

use super::decoder::WaveDataProvider;
use super::formats::WaveFormat;

/// Provider with no audio
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl NullProvider {
    pub fn new() -> Self {
        Self
    }
}

impl WaveDataProvider for NullProvider {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn format(&self) -> WaveFormat {
        WaveFormat::default()
    }

    fn data(&self) -> &[u8] {
        &[]
    }

    fn stream(&mut self, _size: usize) -> usize {
        0
    }

    fn seek(&mut self, _seconds: f32) {}

    fn is_streaming(&self) -> bool {
        false
    }
}
