//! clipmerge - Clip and Slideshow Merge Service
//!
//! An HTTP service that turns a list of video clips or images, an audio
//! track, optional background music and subtitles into a single rendered
//! video using ffmpeg.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod job;
pub mod media;
pub mod pipeline;
pub mod profile;
pub mod reference;
pub mod server;
pub mod state;
pub mod workflow;
