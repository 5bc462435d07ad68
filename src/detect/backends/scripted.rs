use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection, ObjectClass};
use crate::frame::Frame;

/// Backend that replays detections from a script keyed by frame index.
///
/// Script format is JSON lines; blank lines and `#` comments are skipped:
///
/// ```text
/// {"frame": 10, "until": 40, "detections": [{"bbox": [300, 120, 340, 240], "confidence": 0.9}]}
/// ```
///
/// `until` is inclusive and defaults to `frame`. Overlapping spans contribute
/// all of their detections.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    spans: Vec<ScriptSpan>,
}

#[derive(Clone, Debug)]
struct ScriptSpan {
    first: u64,
    last: u64,
    detections: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
struct ScriptLine {
    frame: u64,
    #[serde(default)]
    until: Option<u64>,
    #[serde(default)]
    detections: Vec<ScriptedDetection>,
}

#[derive(Debug, Deserialize)]
struct ScriptedDetection {
    bbox: [f32; 4],
    confidence: f32,
    #[serde(default)]
    class: ObjectClass,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a script file. A missing script is an error, like a missing model.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open detection script {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("invalid detection script {}", path.display()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut backend = Self::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parsed: ScriptLine = serde_json::from_str(trimmed)
                .map_err(|e| anyhow!("line {}: {}", line_no + 1, e))?;
            let last = parsed.until.unwrap_or(parsed.frame);
            if last < parsed.frame {
                return Err(anyhow!(
                    "line {}: until ({}) precedes frame ({})",
                    line_no + 1,
                    last,
                    parsed.frame
                ));
            }
            let detections = parsed
                .detections
                .into_iter()
                .map(|d| Detection {
                    bbox: BoundingBox::new(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]),
                    confidence: d.confidence,
                    class: d.class,
                })
                .collect();
            backend = backend.with_span(parsed.frame, last, detections);
        }
        Ok(backend)
    }

    /// Emit `detections` for every frame index in `first..=last`.
    pub fn with_span(mut self, first: u64, last: u64, detections: Vec<Detection>) -> Self {
        self.spans.push(ScriptSpan {
            first,
            last,
            detections,
        });
        self
    }

    fn detections_for(&self, index: u64) -> Vec<Detection> {
        self.spans
            .iter()
            .filter(|span| (span.first..=span.last).contains(&index))
            .flat_map(|span| span.detections.iter().cloned())
            .collect()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.detections_for(frame.index))
    }
}
