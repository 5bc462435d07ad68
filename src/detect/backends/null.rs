use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Backend that never detects anything. Useful while drawing zones or when
/// running the pipeline without a model.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl DetectorBackend for NullBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(Vec::new())
    }
}
