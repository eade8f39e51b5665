use std::path::PathBuf;

use crate::config::{parse_chunk, Options};
use anyhow::Result;
use clap::Parser;

/// PortAMP - decode audio files to 16-bit PCM
#[derive(Parser, Debug, Default)]
#[command(name = "portamp")]
#[command(version)]
#[command(about = "Decode WAV, MP3 and Ogg Vorbis files to 16-bit PCM", long_about = None)]
pub struct Cli {
    /// Audio files to play
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Dump container metadata while decoding
    #[arg(short, long)]
    pub verbose: bool,

    /// Rewind each file once and play it again
    #[arg(short, long = "loop")]
    pub loop_playback: bool,

    /// Bytes requested per streaming pull
    #[arg(short, long, value_name = "BYTES")]
    pub chunk: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if self.verbose {
            opts.verbose = true;
        }

        if self.loop_playback {
            opts.loop_playback = true;
        }

        if let Some(ref chunk) = self.chunk {
            opts.stream_chunk_bytes = parse_chunk(chunk)?;
        }

        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from(["portamp", "-v", "--loop", "--chunk", "4096", "a.wav", "b.mp3"]);
        assert!(cli.verbose);
        assert!(cli.loop_playback);
        assert_eq!(cli.chunk.as_deref(), Some("4096"));
        assert_eq!(cli.files, vec![PathBuf::from("a.wav"), PathBuf::from("b.mp3")]);
    }

    #[test]
    fn test_merge_basic_options() {
        let cli = Cli {
            verbose: true,
            chunk: Some("2048".to_string()),
            ..Default::default()
        };

        let opts = cli.merge_into_options(Options::default()).unwrap();
        assert!(opts.verbose);
        assert!(!opts.loop_playback);
        assert_eq!(opts.stream_chunk_bytes, 2048);
    }

    #[test]
    fn test_merge_keeps_config_values() {
        let base = Options {
            loop_playback: true,
            stream_chunk_bytes: 1000,
            ..Options::default()
        };
        let opts = Cli::default().merge_into_options(base.clone()).unwrap();
        assert_eq!(opts, base);
    }

    #[test]
    fn test_invalid_chunk() {
        let cli = Cli {
            chunk: Some("invalid".to_string()),
            ..Default::default()
        };

        let result = cli.merge_into_options(Options::default());
        assert!(result.is_err());
    }
}
