//! Post-processing between a backend and the intrusion evaluator.

use std::cmp::Ordering;

use crate::detect::result::{Detection, ObjectClass};

/// Keep people at or above `confidence_threshold`.
pub fn detect_people(detections: Vec<Detection>, confidence_threshold: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.class == ObjectClass::Person && d.confidence >= confidence_threshold)
        .collect()
}

/// Greedy non-maximum suppression: highest confidence first, drop any box
/// overlapping a kept box by more than `iou_threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let overlaps = kept
            .iter()
            .any(|k| k.class == det.class && k.bbox.iou(&det.bbox) > iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    fn det(x: f32, conf: f32, class: ObjectClass) -> Detection {
        Detection {
            bbox: BoundingBox::new(x, 0.0, x + 10.0, 20.0),
            confidence: conf,
            class,
        }
    }

    #[test]
    fn keeps_only_confident_people() {
        let kept = detect_people(
            vec![
                det(0.0, 0.9, ObjectClass::Person),
                det(0.0, 0.49, ObjectClass::Person),
                det(0.0, 0.5, ObjectClass::Person),
                det(0.0, 0.99, ObjectClass::Vehicle),
            ],
            0.5,
        );
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.class == ObjectClass::Person));
    }

    #[test]
    fn nms_drops_overlapping_lower_scores() {
        let kept = non_max_suppression(
            vec![
                det(0.0, 0.6, ObjectClass::Person),
                det(1.0, 0.9, ObjectClass::Person),
                det(100.0, 0.7, ObjectClass::Person),
            ],
            0.4,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.7);
    }
}
