// PortAMP Rust library
// Audio decoding front end: containers and bitstreams to 16-bit PCM

pub mod cli;
pub mod config;
pub mod logging;
pub mod player;
pub mod sound;

pub use cli::Cli;
pub use config::Options;
pub use logging::LogLevel;
pub use sound::{create_provider, WaveDataProvider, WaveFormat};
