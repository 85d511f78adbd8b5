use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the merge HTTP service (default)
    Serve,

    /// Write a configuration file with default values
    InitConfig {
        /// Destination of the generated file
        #[arg(default_value = "config.toml")]
        output: PathBuf,
    },

    /// Verify that ffmpeg can be executed and print its version
    Check,
}

/// Overrides applied on top of the configuration file
#[derive(clap::Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "HOST", global = true)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Path to the ffmpeg binary
    #[arg(long, env = "FFMPEG_PATH", global = true)]
    pub ffmpeg_path: Option<String>,

    /// Path to the ffprobe binary
    #[arg(long, env = "FFPROBE_PATH", global = true)]
    pub ffprobe_path: Option<String>,

    /// Directory receiving rendered files
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Base URL used in responses, e.g. http://localhost:3000
    #[arg(long, env = "PUBLIC_BASE_URL", global = true)]
    pub public_base_url: Option<String>,
}
