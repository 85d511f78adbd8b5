//! Classification and existence checks for media references.
//!
//! A reference is either a remote locator (`http://` or `https://`, any case)
//! handed to the engine as-is, or a local path that must exist before any
//! processing starts.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaReference {
    Remote(String),
    Local(PathBuf),
}

/// Where a reference points, as reported back to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote,
}

impl MediaReference {
    pub fn parse(reference: &str) -> Self {
        if is_remote(reference) {
            return MediaReference::Remote(reference.to_string());
        }

        let path = Path::new(reference);
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        MediaReference::Local(absolute)
    }

    pub fn origin(&self) -> Origin {
        match self {
            MediaReference::Remote(_) => Origin::Remote,
            MediaReference::Local(_) => Origin::Local,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, MediaReference::Remote(_))
    }

    /// The string handed to the engine
    pub fn as_engine_input(&self) -> String {
        match self {
            MediaReference::Remote(url) => url.clone(),
            MediaReference::Local(path) => path.to_string_lossy().to_string(),
        }
    }

    /// Remote references are never checked
    pub fn exists(&self) -> bool {
        match self {
            MediaReference::Remote(_) => true,
            MediaReference::Local(path) => path.exists(),
        }
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaReference::Remote(url) => f.write_str(url),
            MediaReference::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_remote(reference: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        reference
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Collect every local reference that does not exist, in the order given
pub fn validate<'a, I>(references: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a MediaReference>,
{
    references
        .into_iter()
        .filter(|reference| !reference.exists())
        .map(|reference| reference.to_string())
        .collect()
}
