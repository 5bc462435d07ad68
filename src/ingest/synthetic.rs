//! Synthetic source (stub://) for tests and the demo.

use anyhow::Result;
use rand::Rng;

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::{rgb_len, Frame};

pub struct SyntheticSource {
    settings: SourceSettings,
    frame_count: u64,
    /// Simulated scene state, bumped every 50 frames.
    scene_state: u8,
}

impl SyntheticSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn generate_pixels(&mut self) -> Result<Vec<u8>> {
        let len = rgb_len(self.settings.width, self.settings.height)?;

        if self.frame_count > 0 && self.frame_count.is_multiple_of(50) {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut rng = rand::thread_rng();
        let base = self.frame_count.wrapping_add(self.scene_state as u64);
        let mut pixels = vec![0u8; len];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let noise: u8 = rng.gen_range(0..4);
            *pixel = ((i as u64 + base) % 256) as u8 ^ noise;
        }
        Ok(pixels)
    }
}

impl FrameSource for SyntheticSource {
    /// Synthetic sources are always "connected".
    fn connect(&mut self) -> Result<()> {
        log::info!("source: connected to {} (synthetic)", self.settings.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self
            .settings
            .max_frames
            .is_some_and(|max| self.frame_count >= max)
        {
            return Ok(None);
        }
        let pixels = self.generate_pixels()?;
        let frame = Frame::new(
            pixels,
            self.settings.width,
            self.settings.height,
            self.frame_count,
        )?;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.settings.url.clone(),
        }
    }
}
