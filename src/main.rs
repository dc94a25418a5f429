// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use scan_camera::backends::camera::CameraBackendType;
use scan_camera::config::Config;
use scan_camera::pipelines::photo::FilterMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "scan-camera")]
#[command(about = "Capture document pages and compile them with a scanning server")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Processing server base URL (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Use image files as cameras instead of V4L2 devices (repeatable)
    #[arg(long = "image", global = true)]
    images: Vec<PathBuf>,

    /// Config file path (default: ~/.config/scan-camera/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive terminal session (default)
    Terminal,

    /// List available cameras
    List,

    /// Check every camera for working, black or missing frames
    Probe,

    /// Capture pages at a fixed interval, then compile them
    Batch {
        /// Number of pages to capture
        #[arg(short, long, default_value = "1")]
        pages: usize,

        /// Seconds between captures
        #[arg(short, long, default_value = "3")]
        interval: u64,

        /// Camera index to use (from 'scan-camera list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Filter: bw, gray or original
        #[arg(short, long, value_parser = parse_filter)]
        filter: Option<FilterMode>,
    },

    /// Ask the server to clean up its scratch files
    Cleanup,
}

fn parse_filter(value: &str) -> Result<FilterMode, String> {
    FilterMode::parse(value).ok_or_else(|| format!("unknown filter '{}' (bw, gray, original)", value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scan_camera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if !cli.images.is_empty() {
        config.backend = CameraBackendType::Still;
        config.still_images = cli.images;
    }
    config.validate()?;

    match cli.command {
        Some(Commands::Terminal) | None => scan_camera::terminal::run(config, config_path),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Probe) => cli::probe_cameras(&config),
        Some(Commands::Batch {
            pages,
            interval,
            camera,
            filter,
        }) => cli::batch_scan(&config, pages, interval, camera, filter),
        Some(Commands::Cleanup) => cli::cleanup(&config),
    }
}
