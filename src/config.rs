use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, MergeError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Absolute base used for the `url` field of merge responses,
    /// e.g. "http://localhost:3000". Host-relative URLs are returned when unset.
    pub public_base_url: Option<String>,
    /// Directory receiving rendered files, served under `/merge`
    pub output_dir: PathBuf,
    /// Parent directory for per-job scratch directories (system temp dir when unset)
    pub scratch_dir: Option<PathBuf>,
    /// Maximum accepted request body in megabytes
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    /// On Termux this is typically "/data/data/com.termux/files/usr/bin/ffmpeg"
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    /// Upper bound for a single engine or probe invocation
    pub timeout_secs: u64,
    /// How long each image stays on screen in a slideshow
    pub image_duration_secs: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: None,
            output_dir: PathBuf::from("merge"),
            scratch_dir: None,
            body_limit_mb: 50,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: "ffprobe".to_string(),
            timeout_secs: 3600,
            image_duration_secs: 5.0,
        }
    }
}

impl ServerConfig {
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("clipmerge"))
    }

    /// URL under which a rendered file is served
    pub fn output_url(&self, filename: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/merge/{}", base.trim_end_matches('/'), filename),
            None => format!("/merge/{}", filename),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MergeError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MergeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| MergeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.media.timeout_secs == 0 {
            return Err(MergeError::Config("media.timeout_secs must be greater than zero".to_string()));
        }
        if !(self.media.image_duration_secs > 0.0) {
            return Err(MergeError::Config("media.image_duration_secs must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.output_dir, PathBuf::from("merge"));
        assert_eq!(config.media.binary_path, "ffmpeg");
        assert_eq!(config.media.image_duration_secs, 5.0);
    }

    #[test]
    fn output_url_is_relative_without_public_base() {
        let server = ServerConfig::default();
        assert_eq!(server.output_url("out.mp4"), "/merge/out.mp4");

        let server = ServerConfig {
            public_base_url: Some("http://localhost:3000/".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(server.output_url("out.mp4"), "http://localhost:3000/merge/out.mp4");
    }

    #[test]
    fn rejects_non_positive_image_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[media]\nimage_duration_secs = 0.0\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, MergeError::Config(_)));
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = \"eighty\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, MergeError::Toml(_)));
        assert!(err.to_string().starts_with("TOML parsing error"));
    }
}
