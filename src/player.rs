//! Playback loop
//!
//! Pulls canonical PCM out of a provider until it is exhausted. There is no
//! output device; the loop reports what a backend would have received.

use log::{debug, info};

use crate::config::Options;
use crate::sound::{WaveDataProvider, WaveFormat};

/// What one playback pass produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub format: WaveFormat,
    /// Canonical PCM bytes delivered, across all passes
    pub bytes: usize,
    pub passes: u32,
}

impl PlaybackSummary {
    pub fn seconds(&self) -> f32 {
        self.format.duration_of(self.bytes)
    }
}

/// Pull everything the provider has left
fn drain(provider: &mut dyn WaveDataProvider, chunk: usize) -> usize {
    if !provider.is_streaming() {
        return provider.data_size();
    }

    let mut total = 0;
    loop {
        let n = provider.stream(chunk);
        if n == 0 {
            return total;
        }
        total += n;
    }
}

/// Play `provider` once, or twice with a rewind in between when looping
pub fn play(provider: &mut dyn WaveDataProvider, options: &Options) -> PlaybackSummary {
    let chunk = options.stream_chunk_bytes.max(1);
    let format = provider.format();

    let mut bytes = drain(provider, chunk);
    let mut passes = 1;
    debug!("{}: pass 1 delivered {} bytes", provider.name(), bytes);

    if options.loop_playback && bytes > 0 {
        provider.seek(0.0);
        let again = drain(provider, chunk);
        debug!("{}: pass 2 delivered {} bytes", provider.name(), again);
        bytes += again;
        passes += 1;
    }

    info!(
        "{}: {} ch, {} Hz, {} bits, {} bytes",
        provider.name(),
        format.channels,
        format.sample_rate,
        format.bits_per_sample,
        bytes
    );

    PlaybackSummary {
        format,
        bytes,
        passes,
    }
}
