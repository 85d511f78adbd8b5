use std::path::Path;

use crate::filter::{self, AudioInputs, VideoFilters};
use crate::reference::MediaReference;

/// Fixed encoder settings for every rendered output
pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_PRESET: &str = "veryfast";
pub const VIDEO_CRF: &str = "22";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "192k";

/// Protocols the concat demuxer may open; remote clips need the network ones
const CONCAT_PROTOCOLS: &str = "file,http,https,tcp,tls,crypto";

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file or URL
    pub fn input<S: Into<String>>(self, input: S) -> Self {
        self.arg("-i").arg(input)
    }

    /// Add input from a local path
    pub fn input_path<P: AsRef<Path>>(self, path: P) -> Self {
        self.input(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Quiet, non-interactive run reporting progress as key=value lines on stdout
    pub fn engine_defaults(self) -> Self {
        self.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-progress", "pipe:1", "-nostats"])
            .overwrite()
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy every stream without re-encoding
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Add video filter chain
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Add complex filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Map a stream or a labelled filter output into the output file
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Encoder settings shared by both merge pipelines
    pub fn merge_encoding(self) -> Self {
        self.video_codec(VIDEO_CODEC)
            .arg("-preset").arg(VIDEO_PRESET)
            .arg("-crf").arg(VIDEO_CRF)
            .audio_codec(AUDIO_CODEC)
            .arg("-b:a").arg(AUDIO_BITRATE)
            .arg("-shortest")
    }

    /// Value following the first occurrence of `flag`
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|index| self.args.get(index + 1))
            .map(String::as_str)
    }

    /// Every value passed with `-i`, in order
    pub fn inputs(&self) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|pair| pair[0] == "-i")
            .map(|pair| pair[1].as_str())
            .collect()
    }

    /// Last argument, which is the output target for engine commands
    pub fn target(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Builder for the commands the merge pipelines run
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_path: probe_path.into(),
        }
    }

    /// Join the clips listed in a concat manifest without re-encoding
    pub fn concatenate(&self, manifest: &Path, output: &Path) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Concatenation")
            .engine_defaults()
            .arg("-f").arg("concat")
            .arg("-safe").arg("0")
            .arg("-protocol_whitelist").arg(CONCAT_PROTOCOLS)
            .input_path(manifest)
            .copy_streams()
            .output(output)
    }

    /// Put audio, optional music and subtitles onto the merged clip
    pub fn compose(
        &self,
        merged_video: &Path,
        audio: &MediaReference,
        background: Option<&MediaReference>,
        filters: &VideoFilters,
        output: &Path,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Composition")
            .engine_defaults()
            .input_path(merged_video)
            .input(audio.as_engine_input());

        if let Some(background) = background {
            cmd = cmd.input(background.as_engine_input());
        }

        let audio_graph = filter::audio_graph(AudioInputs::for_clips(background.is_some()));

        cmd.video_filter(filters.chain())
            .filter_complex(audio_graph)
            .map("0:v")
            .map(format!("[{}]", filter::AUDIO_OUT))
            .merge_encoding()
            .output(output)
    }

    /// Render images, each shown for `image_duration` seconds, over the audio
    pub fn slideshow(
        &self,
        images: &[MediaReference],
        image_duration: f64,
        audio: &MediaReference,
        background: Option<&MediaReference>,
        filters: &VideoFilters,
        output: &Path,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Slideshow").engine_defaults();

        for image in images {
            cmd = cmd
                .arg("-loop").arg("1")
                .arg("-t").arg(image_duration.to_string())
                .input(image.as_engine_input());
        }

        cmd = cmd.input(audio.as_engine_input());
        if let Some(background) = background {
            cmd = cmd.input(background.as_engine_input());
        }

        let graph = format!(
            "{};{}",
            filters.slideshow_graph(images.len()),
            filter::audio_graph(AudioInputs::for_slideshow(images.len(), background.is_some()))
        );

        cmd.filter_complex(graph)
            .map(format!("[{}]", filter::VIDEO_OUT))
            .map(format!("[{}]", filter::AUDIO_OUT))
            .merge_encoding()
            .output(output)
    }

    /// Read container metadata as JSON
    pub fn probe(&self, path: &Path) -> MediaCommand {
        MediaCommand::new(&self.probe_path, "Metadata probe")
            .arg("-v").arg("error")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .output(path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}
