use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Input files not found: {}", .0.join(", "))]
    MissingInputs(Vec<String>),

    #[error("{0}")]
    Engine(String),

    #[error("Metadata probe failed: {0}")]
    Probe(String),

    #[error("{stage} timed out after {seconds}s")]
    Timeout { stage: String, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;
