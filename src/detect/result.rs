use serde::Deserialize;

use crate::geometry::PixelPoint;

/// Axis-aligned box in pixel space: `(x1, y1)` top-left, `(x2, y2)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from center/size, the layout most detector heads emit.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    #[default]
    Person,
    Vehicle,
    Animal,
    Unknown,
}

impl ObjectClass {
    /// Map a COCO class index (0 = person).
    pub fn from_coco(class_id: usize) -> Self {
        match class_id {
            0 => ObjectClass::Person,
            1..=8 => ObjectClass::Vehicle,
            14..=23 => ObjectClass::Animal,
            _ => ObjectClass::Unknown,
        }
    }
}

/// One observed object for the current frame only. No identity across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class: ObjectClass,
}

impl Detection {
    pub fn person(bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            bbox,
            confidence,
            class: ObjectClass::Person,
        }
    }

    /// Ground-contact anchor: horizontal center of the bottom edge.
    pub fn foot_point(&self) -> PixelPoint {
        PixelPoint::new((self.bbox.x1 + self.bbox.x2) / 2.0, self.bbox.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foot_point_is_bottom_center() {
        for (x1, y1, x2, y2) in [
            (0.0, 0.0, 10.0, 20.0),
            (300.0, 100.0, 340.0, 240.0),
            (12.5, 7.0, 13.5, 9.0),
        ] {
            let det = Detection::person(BoundingBox::new(x1, y1, x2, y2), 0.9);
            let foot = det.foot_point();
            assert_eq!(foot.y, y2);
            assert_eq!(foot.x, (x1 + x2) / 2.0);
        }
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&b), 0.0);
        let half = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&half) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn center_layout_converts() {
        let b = BoundingBox::from_center(50.0, 50.0, 20.0, 40.0);
        assert_eq!(b, BoundingBox::new(40.0, 30.0, 60.0, 70.0));
    }

    #[test]
    fn coco_person_is_class_zero() {
        assert_eq!(ObjectClass::from_coco(0), ObjectClass::Person);
        assert_eq!(ObjectClass::from_coco(2), ObjectClass::Vehicle);
        assert_eq!(ObjectClass::from_coco(70), ObjectClass::Unknown);
    }
}
