use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::filter::non_max_suppression;
use crate::detect::result::{BoundingBox, Detection, ObjectClass};
use crate::frame::{Frame, RGB_CHANNELS};

/// Tract-based backend for YOLOv8-style ONNX detectors.
///
/// Expects a single output of shape `[1, 4 + classes, anchors]` with boxes as
/// center/size in model input pixels followed by per-class scores. Frames are
/// stretched to the model input with nearest-neighbour sampling and boxes are
/// scaled back to frame pixels.
pub struct TractBackend {
    model: RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>,
    input_width: u32,
    input_height: u32,
    confidence_threshold: f32,
    nms_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.is_file() {
            return Err(anyhow!(
                "detector model {} does not exist",
                model_path.display()
            ));
        }
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
            confidence_threshold: 0.5,
            nms_threshold: 0.4,
        })
    }

    pub fn with_thresholds(mut self, confidence: f32, nms: f32) -> Self {
        self.confidence_threshold = confidence;
        self.nms_threshold = nms;
        self
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let pixels = frame.pixels();
        let (src_w, src_h) = (frame.width as usize, frame.height as usize);
        let (dst_w, dst_h) = (self.input_width as usize, self.input_height as usize);
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, dst_h, dst_w),
            |(_, channel, y, x)| {
                let sx = (x * src_w / dst_w).min(src_w - 1);
                let sy = (y * src_h / dst_h).min(src_h - 1);
                let idx = (sy * src_w + sx) * RGB_CHANNELS + channel;
                pixels[idx] as f32 / 255.0
            },
        );
        input.into_tensor()
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &Frame) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output must be rank 3")?;
        let (attrs, anchors) = (view.shape()[1], view.shape()[2]);
        if attrs < 5 {
            return Err(anyhow!("model output has {} attributes, need >= 5", attrs));
        }

        let sx = frame.width as f32 / self.input_width as f32;
        let sy = frame.height as f32 / self.input_height as f32;
        let mut detections = Vec::new();
        for i in 0..anchors {
            let (class_id, score) = (4..attrs)
                .map(|c| (c - 4, view[[0, c, i]]))
                .fold((0, f32::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 {
                        cur
                    } else {
                        best
                    }
                });
            if score < self.confidence_threshold {
                continue;
            }
            let bbox = BoundingBox::from_center(
                view[[0, 0, i]] * sx,
                view[[0, 1, i]] * sy,
                view[[0, 2, i]] * sx,
                view[[0, 3, i]] * sy,
            );
            detections.push(Detection {
                bbox,
                confidence: score,
                class: ObjectClass::from_coco(class_id),
            });
        }
        Ok(non_max_suppression(detections, self.nms_threshold))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        if frame.width == 0 || frame.height == 0 {
            return Err(anyhow!("cannot run inference on an empty frame"));
        }
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame)
    }
}
