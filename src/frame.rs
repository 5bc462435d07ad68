//! Frame container handed from ingestion to detection.
//!
//! A `Frame` lives for exactly one pass through the pipeline. Pixel bytes are
//! packed RGB24, row-major, and only readable through `pixels()`.

use std::time::Instant;

use anyhow::{anyhow, Result};

use crate::geometry::FrameSize;

/// Bytes per pixel for packed RGB24.
pub const RGB_CHANNELS: usize = 3;

pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Sequence number assigned by the source, starting at 0.
    pub index: u64,
    captured_at: Instant,
}

impl Frame {
    /// Wrap RGB24 bytes. The buffer length must match the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame {} expected {} RGB bytes for {}x{}, received {}",
                index,
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            index,
            captured_at: Instant::now(),
        })
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

/// Byte length of one packed RGB24 frame.
pub fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(RGB_CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions {}x{} overflow", width, height))
}
