//! Merge requests as received over HTTP and the validated jobs built from them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::{Result, MergeError};
use crate::profile::{DeviceProfile, Resolution};
use crate::reference::{self, MediaReference, Origin};

/// Which pipeline a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// Concatenate video clips, then compose audio and subtitles on top
    Clips,
    /// Turn still images into a video in a single stage
    Slideshow,
}

/// Request body shared by `/vdo/merge` and `/img/merge`.
/// Every field is optional here; `into_job` decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeRequest {
    pub filename: Option<String>,
    pub inputvdo: Option<Vec<String>>,
    pub inputaud: Option<String>,
    pub inputbgm: Option<String>,
    pub subtitle: Option<String>,
    pub device: Option<String>,
}

/// A validated, immutable merge job
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub id: Uuid,
    pub kind: MergeKind,
    pub filename: String,
    pub inputs: Vec<MediaReference>,
    pub audio: MediaReference,
    pub background: Option<MediaReference>,
    pub subtitle: Option<MediaReference>,
    pub profile: DeviceProfile,
}

/// A reference echoed back to the client together with its origin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub reference: String,
    pub origin: Origin,
}

impl MergeRequest {
    /// Check required fields and build a typed job.
    ///
    /// Empty strings and an empty input list count as absent. Existence of
    /// local files is checked separately by [`MergeJob::missing_inputs`].
    pub fn into_job(self, kind: MergeKind) -> Result<MergeJob> {
        let filename = non_empty(self.filename);
        let inputs = self
            .inputvdo
            .map(|list| list.into_iter().filter(|item| !item.trim().is_empty()).collect::<Vec<_>>())
            .filter(|list| !list.is_empty());
        let audio = non_empty(self.inputaud);

        let mut absent = Vec::new();
        if filename.is_none() {
            absent.push("filename");
        }
        if inputs.is_none() {
            absent.push("inputvdo");
        }
        if audio.is_none() {
            absent.push("inputaud");
        }

        let (Some(filename), Some(inputs), Some(audio)) = (filename, inputs, audio) else {
            return Err(MergeError::InvalidRequest(format!(
                "Missing required fields: {}",
                absent.join(", ")
            )));
        };

        check_filename(&filename)?;

        Ok(MergeJob {
            id: Uuid::new_v4(),
            kind,
            filename,
            inputs: inputs.iter().map(|item| MediaReference::parse(item)).collect(),
            audio: MediaReference::parse(&audio),
            background: non_empty(self.inputbgm).map(|item| MediaReference::parse(&item)),
            subtitle: non_empty(self.subtitle).map(|item| MediaReference::parse(&item)),
            profile: DeviceProfile::from_token(self.device.as_deref()),
        })
    }
}

impl MergeJob {
    pub fn resolution(&self) -> Resolution {
        self.profile.resolution()
    }

    /// Every referenced local file that does not exist, across all categories
    pub fn missing_inputs(&self) -> Vec<String> {
        let references = self
            .inputs
            .iter()
            .chain(std::iter::once(&self.audio))
            .chain(self.background.iter())
            .chain(self.subtitle.iter());

        reference::validate(references)
    }

    /// Fail with the full list of missing local files, if any
    pub fn ensure_inputs_exist(&self) -> Result<()> {
        let missing = self.missing_inputs();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MergeError::MissingInputs(missing))
        }
    }

    pub fn summarize_inputs(&self) -> Vec<InputSummary> {
        self.inputs.iter().map(summarize).collect()
    }
}

pub fn summarize(reference: &MediaReference) -> InputSummary {
    InputSummary {
        reference: reference.to_string(),
        origin: reference.origin(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Output names must stay inside the output directory
fn check_filename(filename: &str) -> Result<()> {
    let path = Path::new(filename);
    let is_bare_name = path.file_name().is_some_and(|name| name == filename)
        && !filename.contains('/')
        && !filename.contains('\\');

    if is_bare_name {
        Ok(())
    } else {
        Err(MergeError::InvalidRequest(format!(
            "filename must be a plain file name, got '{}'",
            filename
        )))
    }
}
