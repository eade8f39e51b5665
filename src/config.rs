use std::path::Path;

use anyhow::{Context, Result};

use crate::logging::LogLevel;

/// Default size of one streaming pull, in bytes
pub const DEFAULT_STREAM_CHUNK: usize = 65536;

/// Application options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Dump container metadata while decoding
    pub verbose: bool,
    pub log_level: LogLevel,
    /// Bytes requested per streaming pull
    pub stream_chunk_bytes: usize,
    /// Rewind each stream once and play it again
    pub loop_playback: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verbose: false,
            log_level: LogLevel::Warning,
            stream_chunk_bytes: DEFAULT_STREAM_CHUNK,
            loop_playback: false,
        }
    }
}

impl Options {
    /// Effective log level; verbose output needs debug records
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            self.log_level.max(LogLevel::Debug)
        } else {
            self.log_level
        }
    }
}

/// Parse a boolean config value
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid boolean value: {}", s),
    }
}

/// Parse a stream chunk size in bytes
pub fn parse_chunk(s: &str) -> Result<usize> {
    let chunk: usize = s.trim().parse().context("Invalid stream chunk size")?;
    if chunk == 0 {
        anyhow::bail!("Stream chunk size must be positive");
    }
    Ok(chunk)
}

/// Apply `key = value` lines on top of `opts`
///
/// Blank lines and `#` comments are ignored.
pub fn parse_config(text: &str, mut opts: Options) -> Result<Options> {
    for (number, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("line {}: expected key = value", number + 1))?;
        let value = value.trim();

        match key.trim() {
            "verbose" => opts.verbose = parse_bool(value)?,
            "log_level" => {
                opts.log_level = LogLevel::parse(value)
                    .with_context(|| format!("line {}: invalid log level {}", number + 1, value))?
            }
            "stream_chunk" => opts.stream_chunk_bytes = parse_chunk(value)?,
            "loop" => opts.loop_playback = parse_bool(value)?,
            other => anyhow::bail!("line {}: unknown key {}", number + 1, other),
        }
    }
    Ok(opts)
}

/// Load configuration from a config file
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Options> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Options::default()),
    };
    if !path.exists() {
        return Ok(Options::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&text, Options::default())
        .with_context(|| format!("Invalid config {}", path.display()))
}
