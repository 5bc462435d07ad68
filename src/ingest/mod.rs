//! Frame ingestion sources.
//!
//! Sources hand out one `Frame` at a time to the monitor loop:
//! - `stub://<name>` synthetic frames (testing, demo)
//! - `raw:<path>` packed RGB24 frames read from a local file
//!
//! `next_frame` returning `Ok(None)` is a clean end of stream. An `Err` is a
//! read failure and ends the run.

mod raw;
mod synthetic;

use anyhow::{anyhow, Result};

use crate::config::SourceSettings;
use crate::frame::Frame;

pub use raw::RawFileSource;
pub use synthetic::SyntheticSource;

pub trait FrameSource {
    fn connect(&mut self) -> Result<()>;

    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// Build a source from its configured URL scheme.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(settings.clone())));
    }
    if let Some(path) = settings.url.strip_prefix("raw:") {
        return Ok(Box::new(RawFileSource::open(
            path,
            settings.width,
            settings.height,
        )?));
    }
    Err(anyhow!(
        "unsupported source url '{}' (expected stub://<name> or raw:<path>)",
        settings.url
    ))
}
