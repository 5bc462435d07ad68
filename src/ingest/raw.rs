//! Packed RGB24 frames from a local file.
//!
//! The file is a plain concatenation of `width * height * 3` byte frames,
//! e.g. the output of `ffmpeg -f rawvideo -pix_fmt rgb24`.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::{FrameSource, SourceStats};
use crate::frame::{rgb_len, Frame};

pub struct RawFileSource {
    path: PathBuf,
    reader: BufReader<File>,
    width: u32,
    height: u32,
    frame_len: usize,
    frame_count: u64,
    failed: bool,
}

impl RawFileSource {
    pub fn open(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let frame_len = rgb_len(width, height)?;
        if frame_len == 0 {
            return Err(anyhow!("raw source needs a non-zero frame size"));
        }
        let file = File::open(&path)
            .with_context(|| format!("open raw frame file {}", path.display()))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            width,
            height,
            frame_len,
            frame_count: 0,
            failed: false,
        })
    }

    /// Fill `buf` completely. Returns the number of bytes read before EOF.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(err).with_context(|| format!("read {}", self.path.display()))
                }
            }
        }
        Ok(filled)
    }
}

impl FrameSource for RawFileSource {
    fn connect(&mut self) -> Result<()> {
        log::info!(
            "source: reading {}x{} RGB24 frames from {}",
            self.width,
            self.height,
            self.path.display()
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut buf = vec![0u8; self.frame_len];
        let filled = match self.read_full(&mut buf) {
            Ok(filled) => filled,
            Err(err) => {
                self.failed = true;
                return Err(err);
            }
        };
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.frame_len {
            self.failed = true;
            return Err(anyhow!(
                "truncated frame {} in {}: {} of {} bytes",
                self.frame_count,
                self.path.display(),
                filled,
                self.frame_len
            ));
        }
        let frame = Frame::new(buf, self.width, self.height, self.frame_count)?;
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn is_healthy(&self) -> bool {
        !self.failed
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: format!("raw:{}", self.path.display()),
        }
    }
}
