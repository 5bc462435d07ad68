use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// Backends receive a frame and return pixel-space detections for that frame
/// only. They must not derive foot points or keep cross-frame identity; the
/// caller filters to people and applies the confidence threshold.
///
/// `detect` is a bounded synchronous call with no timeout. A slow backend
/// lowers the effective frame rate; frames are neither buffered nor dropped.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
