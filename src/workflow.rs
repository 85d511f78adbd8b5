use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::job::{self, InputSummary, MergeKind, MergeRequest};
use crate::media::MediaProcessorTrait;
use crate::pipeline::MergePipeline;

/// Body returned for a successful merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeResponse {
    pub status: &'static str,
    pub file: String,
    pub url: String,
    pub duration: f64,
    pub resolution: String,
    pub inputs: InputsSummary,
}

/// Which references were local files and which were remote
#[derive(Debug, Clone, Serialize)]
pub struct InputsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<InputSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<InputSummary>>,
    pub audio: InputSummary,
    pub subtitle: Option<InputSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgm: Option<InputSummary>,
}

pub struct Workflow {
    config: Config,
    media: Arc<dyn MediaProcessorTrait>,
}

impl Workflow {
    pub fn new(config: Config, media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { config, media }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate the request, render it and describe the result.
    ///
    /// Nothing reaches the engine unless every required field is present and
    /// every local reference exists.
    pub async fn merge(&self, kind: MergeKind, request: MergeRequest) -> Result<MergeResponse> {
        let job = request.into_job(kind)?;

        if let Err(e) = job.ensure_inputs_exist() {
            warn!("Job {} rejected: {}", job.id, e);
            return Err(e);
        }

        info!(
            "Job {} accepted: {:?} of {} inputs into {}",
            job.id,
            kind,
            job.inputs.len(),
            job.filename
        );

        let pipeline = MergePipeline::new(self.media.as_ref(), &self.config);
        let report = pipeline.run(&job).await?;

        let summaries = job.summarize_inputs();
        let (videos, images) = match kind {
            MergeKind::Clips => (Some(summaries), None),
            MergeKind::Slideshow => (None, Some(summaries)),
        };

        Ok(MergeResponse {
            status: "success",
            url: self.config.server.output_url(&job.filename),
            file: job.filename.clone(),
            duration: report.metadata.duration,
            resolution: job.resolution().to_string(),
            inputs: InputsSummary {
                videos,
                images,
                audio: job::summarize(&job.audio),
                subtitle: job.subtitle.as_ref().map(job::summarize),
                bgm: job.background.as_ref().map(job::summarize),
            },
        })
    }
}
