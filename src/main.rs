//! Binary entrypoint for the carousel.
//!
//! Delegates all logic to the library crate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use rust_carousel::config::Configuration;
use rust_carousel::home::Home;
use rust_carousel::render::viewer;

#[derive(Debug, Parser)]
#[command(name = "carousel", about = "Image carousel with swipe and keyboard navigation")]
struct Cli {
    /// Path to YAML config file
    #[arg(value_name = "FILE", default_value = "carousel.yaml")]
    config: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Print the resolved slides and exit
    #[arg(long)]
    list: bool,

    /// Start in borderless fullscreen
    #[arg(long)]
    fullscreen: bool,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in [
        format!("rust_carousel={level}"),
        "wgpu=warn".to_string(),
        "naga=warn".to_string(),
        "winit=warn".to_string(),
    ] {
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("invalid log directive {directive}"))?,
        );
    }
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?
        .validated()
        .context("validating configuration")?;
    if cli.fullscreen {
        cfg.window.fullscreen = true;
    }

    if cli.list {
        for (i, slide) in cfg.slides.iter().enumerate() {
            println!("{:>3}  {}  {}", i + 1, slide.source, slide.alt_text);
        }
        return Ok(());
    }

    let home = Home::from_config(&cfg);
    info!(slides = home.slides().len(), title = ?home.title(), "configuration loaded");
    viewer::run_windowed(home, cfg)
}
