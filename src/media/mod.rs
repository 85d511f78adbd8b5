// Media engine boundary
//
// Everything that touches ffmpeg/ffprobe goes through this module:
// - Commands: command values and the builder for merge stages
// - Processor: subprocess execution, timeouts, progress and probing

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Metadata read back from a rendered file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Container duration in seconds
    pub duration: f64,
}

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Run one engine stage to completion
    async fn execute_command(&self, command: &MediaCommand) -> Result<()>;

    /// Read metadata of a media file
    async fn probe(&self, path: &Path) -> Result<MediaMetadata>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
