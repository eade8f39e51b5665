use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use log::{error, info};

use portamp_rust::config::{self, Options};
use portamp_rust::{create_provider, logging, player, Cli};

fn play_file(path: &Path, options: &Options) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path.display().to_string();

    let mut provider = create_provider(&name, Bytes::from(data), options);
    let summary = player::play(provider.as_mut(), options);

    println!(
        "{}: {} ({} ch, {} Hz, {} bits) {} bytes, {:.2}s",
        name,
        provider.name(),
        summary.format.channels,
        summary.format.sample_rate,
        summary.format.bits_per_sample,
        summary.bytes,
        summary.seconds()
    );
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration file, then let the command line override it
    let options = config::load_config(cli.config.as_deref())?;
    let options = cli.merge_into_options(options)?;

    logging::init(options.effective_log_level());
    info!("PortAMP starting with {} file(s)", cli.files.len());

    if cli.files.is_empty() {
        anyhow::bail!("No input files");
    }

    let mut failed = 0;
    for path in &cli.files {
        if let Err(e) = play_file(path, &options) {
            error!("{:#}", e);
            failed += 1;
        }
    }

    if failed == cli.files.len() {
        anyhow::bail!("None of the input files could be read");
    }
    Ok(())
}
