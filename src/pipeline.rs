//! Stage sequencing for merge jobs.
//!
//! Clips run in two stages (concatenate, then compose); slideshows run in
//! one. Each stage starts only after the previous one succeeded. Scratch
//! files live in a per-job directory that is removed on every exit path, and
//! the output is rendered under a temporary name and only published once the
//! last stage succeeds.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::filter::VideoFilters;
use crate::job::{MergeJob, MergeKind};
use crate::media::{MediaCommandBuilder, MediaMetadata, MediaProcessorTrait};
use crate::reference::MediaReference;

/// Outcome of a successful pipeline run
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output: PathBuf,
    pub metadata: MediaMetadata,
}

pub struct MergePipeline<'a> {
    media: &'a dyn MediaProcessorTrait,
    commands: MediaCommandBuilder,
    output_dir: PathBuf,
    scratch_root: PathBuf,
    image_duration: f64,
}

impl<'a> MergePipeline<'a> {
    pub fn new(media: &'a dyn MediaProcessorTrait, config: &Config) -> Self {
        Self {
            media,
            commands: MediaCommandBuilder::new(&config.media.binary_path, &config.media.probe_path),
            output_dir: config.server.output_dir.clone(),
            scratch_root: config.server.scratch_root(),
            image_duration: config.media.image_duration_secs,
        }
    }

    /// Render the job into the output directory and probe the result
    pub async fn run(&self, job: &MergeJob) -> Result<RenderReport> {
        fs::create_dir_all(&self.output_dir).await?;

        let output = self.output_dir.join(&job.filename);
        let pending = PendingOutput::new(&self.output_dir, job.id, &job.filename);
        let filters = VideoFilters::new(job.resolution(), job.subtitle.as_ref());

        match job.kind {
            MergeKind::Clips => self.render_clips(job, &filters, pending.path()).await?,
            MergeKind::Slideshow => self.render_slideshow(job, &filters, pending.path()).await?,
        }

        pending.publish(&output).await?;
        info!("Job {} rendered {}", job.id, output.display());

        let metadata = self.media.probe(&output).await?;
        Ok(RenderReport { output, metadata })
    }

    async fn render_clips(&self, job: &MergeJob, filters: &VideoFilters, target: &Path) -> Result<()> {
        let scratch = JobScratch::create(&self.scratch_root, job.id)?;
        let manifest = scratch.manifest();
        let merged = scratch.merged_video();

        fs::write(&manifest, concat_manifest(&job.inputs)).await?;
        debug!("Job {} wrote concat manifest {}", job.id, manifest.display());

        info!("Job {} stage 1/2: concatenating {} clips", job.id, job.inputs.len());
        let concat = self.commands.concatenate(&manifest, &merged);
        self.media.execute_command(&concat).await?;

        info!("Job {} stage 2/2: composing at {}", job.id, job.resolution());
        let compose = self.commands.compose(
            &merged,
            &job.audio,
            job.background.as_ref(),
            filters,
            target,
        );
        self.media.execute_command(&compose).await?;

        Ok(())
    }

    async fn render_slideshow(&self, job: &MergeJob, filters: &VideoFilters, target: &Path) -> Result<()> {
        info!(
            "Job {} rendering slideshow of {} images at {}",
            job.id,
            job.inputs.len(),
            job.resolution()
        );

        let slideshow = self.commands.slideshow(
            &job.inputs,
            self.image_duration,
            &job.audio,
            job.background.as_ref(),
            filters,
            target,
        );
        self.media.execute_command(&slideshow).await
    }
}

/// Concat demuxer manifest listing every input in order
pub fn concat_manifest(inputs: &[MediaReference]) -> String {
    inputs
        .iter()
        .map(|input| format!("file '{}'\n", input.as_engine_input().replace('\'', r"'\''")))
        .collect()
}

/// Per-job scratch directory holding the manifest and the merged clip
struct JobScratch {
    dir: TempDir,
}

impl JobScratch {
    fn create(root: &Path, job_id: Uuid) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job_id))
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("inputs.txt")
    }

    fn merged_video(&self) -> PathBuf {
        self.dir.path().join("merged.mp4")
    }
}

/// Output rendered under a hidden name until every stage succeeded.
/// Dropped without being published, the partial file is deleted.
struct PendingOutput {
    path: PathBuf,
    published: bool,
}

impl PendingOutput {
    fn new(output_dir: &Path, job_id: Uuid, filename: &str) -> Self {
        // Same extension as the final name so the engine picks the same container
        Self {
            path: output_dir.join(format!(".{}-{}", job_id, filename)),
            published: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn publish(mut self, output: &Path) -> Result<()> {
        fs::rename(&self.path, output).await?;
        self.published = true;
        Ok(())
    }
}

impl Drop for PendingOutput {
    fn drop(&mut self) {
        if self.published || !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove partial output {}: {}", self.path.display(), e);
        }
    }
}
