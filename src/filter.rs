//! Filter expressions handed to the engine.
//!
//! Video filters scale to the target resolution and optionally burn in
//! subtitles. The audio graph always ends on the `[aout]` bus: either the
//! primary track alone or the primary track mixed with quieter background
//! music, cut at the shorter of the two.

use crate::profile::Resolution;
use crate::reference::MediaReference;

/// Gain applied to the primary audio track
pub const PRIMARY_GAIN: &str = "1.0";
/// Gain applied to background music
pub const BACKGROUND_GAIN: &str = "0.1";
/// Style used when burning subtitles into the picture
pub const SUBTITLE_STYLE: &str = "FontSize=32,Outline=1,Shadow=1";
/// Output bus carrying the final audio
pub const AUDIO_OUT: &str = "aout";
/// Output bus carrying the final slideshow video
pub const VIDEO_OUT: &str = "vout";

/// Engine input positions of the audio tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInputs {
    pub primary: usize,
    pub background: Option<usize>,
}

impl AudioInputs {
    /// Composition stage of the clip pipeline: merged video 0, audio 1, music 2
    pub fn for_clips(has_background: bool) -> Self {
        Self {
            primary: 1,
            background: has_background.then_some(2),
        }
    }

    /// Slideshow: images take 0..n, audio follows, then music
    pub fn for_slideshow(image_count: usize, has_background: bool) -> Self {
        Self {
            primary: image_count,
            background: has_background.then_some(image_count + 1),
        }
    }
}

/// Ordered video filters: scale first, then subtitle burn-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFilters {
    scale: String,
    subtitles: Option<String>,
}

impl VideoFilters {
    pub fn new(resolution: Resolution, subtitle: Option<&MediaReference>) -> Self {
        Self {
            scale: format!("scale={}:{}", resolution.width, resolution.height),
            subtitles: subtitle.map(|reference| {
                format!(
                    "subtitles={}:force_style='{}'",
                    escape_graph(&escape_option(&reference.as_engine_input())),
                    SUBTITLE_STYLE
                )
            }),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        std::iter::once(self.scale.clone())
            .chain(self.subtitles.clone())
            .collect()
    }

    /// Filters joined into a single `-vf` chain
    pub fn chain(&self) -> String {
        self.to_vec().join(",")
    }

    /// Video part of the slideshow graph.
    ///
    /// Every image is scaled on its own so the segments share one size, the
    /// segments are joined in input order and subtitles go on top of the
    /// joined stream.
    pub fn slideshow_graph(&self, image_count: usize) -> String {
        let mut parts: Vec<String> = (0..image_count)
            .map(|i| format!("[{i}:v]{},setsar=1,format=yuv420p[v{i}]", self.scale))
            .collect();

        let labels: String = (0..image_count).map(|i| format!("[v{i}]")).collect();
        let mut joined = format!("{labels}concat=n={image_count}:v=1:a=0");
        if let Some(subtitles) = &self.subtitles {
            joined.push(',');
            joined.push_str(subtitles);
        }
        joined.push_str(&format!("[{VIDEO_OUT}]"));
        parts.push(joined);

        parts.join(";")
    }
}

/// Audio filter graph ending on the `[aout]` bus
pub fn audio_graph(inputs: AudioInputs) -> String {
    match inputs.background {
        None => format!("[{}:a]volume={}[{}]", inputs.primary, PRIMARY_GAIN, AUDIO_OUT),
        Some(background) => format!(
            "[{}:a]volume={}[a1];[{}:a]volume={}[a2];[a1][a2]amix=inputs=2:duration=shortest[{}]",
            inputs.primary, PRIMARY_GAIN, background, BACKGROUND_GAIN, AUDIO_OUT
        ),
    }
}

/// Escape a filter option value so `:` and quotes stay part of it
fn escape_option(value: &str) -> String {
    escape_chars(value, &['\\', '\'', ':'])
}

/// Escape a filter description for the graph parser, which unescapes once
/// before handing option strings to the filter
fn escape_graph(value: &str) -> String {
    escape_chars(value, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
