//! Sound decoding front end for PortAMP
//!
//! Turns in-memory audio files into canonical 16-bit PCM for the playback
//! loop.
//!
//! # Architecture
//!
//! - `WaveDataProvider` trait defines the provider interface
//! - `WaveFormat` describes the canonical output stream
//! - `wav` parses RIFF/WAVE containers and materializes the whole payload,
//!   using `convert` and `msadpcm` for non-canonical encodings
//! - `mp3` and `ogg` decode compressed bitstreams incrementally
//! - `factory` sniffs the input once and picks a provider

pub mod convert;
pub mod decoder;
pub mod factory;
pub mod formats;
pub mod mp3;
pub mod msadpcm;
pub mod null;
pub mod ogg;
pub mod riff;
pub mod stream;
pub mod wav;

pub use decoder::{DecodeError, DecodeResult, WaveDataProvider};
pub use factory::{create_provider, sniff, SourceKind};
pub use formats::WaveFormat;
pub use mp3::Mp3DataProvider;
pub use null::NullProvider;
pub use ogg::OggDataProvider;
pub use wav::{extract_embedded_mp3, WavDataProvider};
