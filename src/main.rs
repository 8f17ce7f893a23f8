//! ROI Scanner - command line front end
//!
//! Runs the scanner pipeline against still images standing in for a camera,
//! and exposes the ROI transform and configuration for inspection.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use roi_scanner::app::{ScannerPage, HINT, TITLE};
use roi_scanner::audio::{notifier_for, Notifier, SilentNotifier};
use roi_scanner::capture::StillImageCamera;
use roi_scanner::config::{self, AppConfig};
use roi_scanner::overlay::{compute_layout, Size};
use roi_scanner::storage;
use roi_scanner::vision::{DecoderSupport, QrDetector};

/// ROI Scanner - barcode scanning through a region of interest
#[derive(Parser, Debug)]
#[command(name = "roi-scanner")]
#[command(about = "Crop video frames to a centred ROI and decode barcodes inside it")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan images as if they were successive camera frames
    Scan {
        /// Image files, one per detection cycle
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Display container size the video is cover-fitted into
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        container: Size,

        /// Number of detection cycles to run (defaults to one per image)
        #[arg(long)]
        cycles: Option<u64>,

        /// Print the final history as JSON
        #[arg(long)]
        json: bool,

        /// Do not beep on new scans
        #[arg(long)]
        mute: bool,
    },

    /// Print the ROI layout for a video size inside a container
    Roi {
        /// Native video size, e.g. 1920x1080
        #[arg(long, value_parser = parse_size)]
        video: Size,

        /// Container size, e.g. 800x600
        #[arg(long, value_parser = parse_size)]
        container: Size,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => storage::default_config_path().ok(),
    };
    let config = load_or_create_config(config_path.as_deref());

    match args.command {
        Command::Scan {
            images,
            container,
            cycles,
            json,
            mute,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            let cycles = cycles.unwrap_or(images.len() as u64);
            runtime.block_on(run_scan(&config, &images, container, cycles, json, mute))
        }
        Command::Roi { video, container } => print_roi(&config, video, container),
        Command::Config { save } => {
            println!("{}", toml::to_string_pretty(&config)?);
            if save {
                let path = config_path.ok_or_else(|| anyhow!("No configuration path available"))?;
                config::save_config(&config, &path)?;
                info!("Saved configuration to {:?}", path);
            }
            Ok(())
        }
    }
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(path: Option<&Path>) -> AppConfig {
    if let Some(path) = path {
        if path.exists() {
            match config::load_config(path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    return config;
                }
                Err(e) => warn!("Ignoring invalid configuration: {:#}", e),
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

async fn run_scan(
    config: &AppConfig,
    images: &[PathBuf],
    container: Size,
    cycles: u64,
    json: bool,
    mute: bool,
) -> Result<()> {
    let camera = StillImageCamera::open(images)?;
    let support = DecoderSupport::supported(QrDetector::new(&config.scanner.formats));
    let notifier: Arc<dyn Notifier> = if mute {
        Arc::new(SilentNotifier)
    } else {
        notifier_for(&config.sound)
    };

    println!("{}", TITLE);
    println!("{}", HINT);

    let mut page = ScannerPage::mount(&camera, support, config, container, notifier).await;

    if let Some(error) = page.scanner().error() {
        let message = error.to_string();
        page.unmount().await;
        bail!(message);
    }
    if let Some(notice) = page.scanner().notice() {
        println!("{}", notice);
    }
    if let Some(overlay) = page.scanner().overlay() {
        info!(
            "ROI {:.0}x{:.0} at ({:.0}, {:.0}) - {}",
            overlay.roi.width, overlay.roi.height, overlay.roi.left, overlay.roi.top, overlay.instruction
        );
    }

    let added = page.run_cycles(cycles).await;
    info!(
        "Ran {} detection cycle(s), {} new code(s)",
        page.state.read().cycles_completed,
        added
    );

    if json {
        println!("{}", serde_json::to_string_pretty(page.history())?);
    } else if let Some(summary) = page.results_summary() {
        println!("{}", summary);
        for row in page.result_rows() {
            println!("  {:>8}  {}", row.label, row.code);
        }
    } else {
        println!("No barcodes found");
    }

    page.unmount().await;
    Ok(())
}

fn print_roi(config: &AppConfig, video: Size, container: Size) -> Result<()> {
    let layout = compute_layout(video, container, &config.roi)
        .ok_or_else(|| anyhow!("Video and container sizes must be positive"))?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

/// Parse "WIDTHxHEIGHT"
fn parse_size(s: &str) -> Result<Size> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {:?}", s))?;
    let width: f64 = w.trim().parse().with_context(|| format!("invalid width {:?}", w))?;
    let height: f64 = h.trim().parse().with_context(|| format!("invalid height {:?}", h))?;
    if width <= 0.0 || height <= 0.0 {
        bail!("dimensions must be positive, got {:?}", s);
    }
    Ok(Size::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600").unwrap(), Size::new(800.0, 600.0));
        assert_eq!(parse_size("1920X1080").unwrap(), Size::new(1920.0, 1080.0));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_cli_parses_scan() {
        let args = Args::try_parse_from(["roi-scanner", "scan", "a.png", "b.png", "--json"]).unwrap();
        match args.command {
            Command::Scan {
                images,
                container,
                cycles,
                json,
                ..
            } => {
                assert_eq!(images.len(), 2);
                assert_eq!(container, Size::new(800.0, 600.0));
                assert_eq!(cycles, None);
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
