//! clipmerge - Clip and Slideshow Merge Service
//!
//! Entry point: loads configuration, sets up logging and either serves the
//! merge API or runs one of the maintenance commands.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use clipmerge::cli::{Args, Commands, ServeArgs};
use clipmerge::config::Config;
use clipmerge::media::{MediaProcessorFactory, MediaProcessorTrait};
use clipmerge::server;
use clipmerge::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Command line and environment values win over the configuration file
    apply_overrides(&mut config, args.serve);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let media: Arc<dyn MediaProcessorTrait> =
                Arc::from(MediaProcessorFactory::create_processor(config.media.clone()));
            media.check_availability()?;

            tokio::fs::create_dir_all(&config.server.output_dir).await?;
            info!("Serving rendered files from {}", config.server.output_dir.display());

            let (host, port) = (config.server.host.clone(), config.server.port);
            let state = AppState::new(config, media);
            server::serve(state, &host, port).await?;
        }
        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("{} already exists", output.display());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Check => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability()?;
            println!("{}", media.get_version_info().await?);
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, overrides: ServeArgs) {
    if let Some(host) = overrides.host {
        config.server.host = host;
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(path) = overrides.ffmpeg_path {
        config.media.binary_path = path;
    }
    if let Some(path) = overrides.ffprobe_path {
        config.media.probe_path = path;
    }
    if let Some(dir) = overrides.output_dir {
        config.server.output_dir = dir;
    }
    if let Some(url) = overrides.public_base_url {
        config.server.public_base_url = Some(url);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".clipmerge").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "clipmerge.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("clipmerge.log").display());

    Ok(())
}
