//! Zone authoring state machine.
//!
//! DRAWING accepts point edits; MONITORING freezes geometry. The transition
//! is one-way, operator-triggered, and needs at least three distinct points.

use anyhow::{anyhow, Result};

use crate::geometry::{distinct_point_count, FrameSize, GeometryError, NormPoint, PixelPoint};
use crate::zone::{Rgb, Zone, ZoneRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorPhase {
    Drawing,
    Monitoring,
}

impl EditorPhase {
    /// Operator-facing status line.
    pub fn status(&self) -> &'static str {
        match self {
            EditorPhase::Drawing => "Drawing Zone (add points, then commit)",
            EditorPhase::Monitoring => "Intrusion Monitoring",
        }
    }
}

#[derive(Debug)]
pub struct PolygonEditor {
    phase: EditorPhase,
    draft: Vec<NormPoint>,
    registry: ZoneRegistry,
}

impl PolygonEditor {
    /// Start in DRAWING with an empty registry.
    pub fn new() -> Self {
        Self {
            phase: EditorPhase::Drawing,
            draft: Vec::new(),
            registry: ZoneRegistry::new(),
        }
    }

    /// Start directly in MONITORING with zones loaded from configuration.
    pub fn monitoring(mut registry: ZoneRegistry) -> Result<Self> {
        if registry.is_empty() {
            return Err(anyhow!("cannot monitor without at least one zone"));
        }
        registry.freeze();
        Ok(Self {
            phase: EditorPhase::Monitoring,
            draft: Vec::new(),
            registry,
        })
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn is_monitoring(&self) -> bool {
        self.phase == EditorPhase::Monitoring
    }

    pub fn draft(&self) -> &[NormPoint] {
        &self.draft
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Append a pointer click, given in pixels of the frame it was made on.
    pub fn add_point(&mut self, click: PixelPoint, frame: FrameSize) -> Result<()> {
        self.ensure_drawing()?;
        frame.validate()?;
        let point = click.normalize(frame);
        if !point.is_finite() || !point.in_unit_square() {
            return Err(GeometryError::OutOfBounds {
                x: point.x,
                y: point.y,
            }
            .into());
        }
        self.draft.push(point);
        Ok(())
    }

    /// Drop the most recent draft point.
    pub fn undo_point(&mut self) -> Result<Option<NormPoint>> {
        self.ensure_drawing()?;
        Ok(self.draft.pop())
    }

    /// Close the draft polygon and start monitoring.
    ///
    /// On failure nothing changes: the draft, registry and phase are as before.
    pub fn commit(&mut self, name: &str, color: Rgb) -> Result<&Zone> {
        self.ensure_drawing()?;
        let distinct = distinct_point_count(&self.draft);
        if distinct < 3 {
            return Err(GeometryError::TooFewPoints { found: distinct }.into());
        }

        let zone = Zone::new(name, self.draft.clone(), color)?;

        // Freezing closes the ring.
        let mut registry = self.registry.clone();
        registry.push(zone)?;
        registry.freeze();

        self.registry = registry;
        self.draft.clear();
        self.phase = EditorPhase::Monitoring;

        let index = self.registry.len() - 1;
        self.registry
            .get(index)
            .ok_or_else(|| anyhow!("committed zone missing from registry"))
    }

    fn ensure_drawing(&self) -> Result<()> {
        if self.phase == EditorPhase::Monitoring {
            return Err(anyhow!("zone geometry is frozen while monitoring"));
        }
        Ok(())
    }
}

impl Default for PolygonEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::DEFAULT_ZONE_COLOR;

    const VGA: FrameSize = FrameSize {
        width: 640,
        height: 480,
    };

    fn draw_triangle(editor: &mut PolygonEditor) {
        for (x, y) in [(64.0, 48.0), (576.0, 48.0), (320.0, 432.0)] {
            editor.add_point(PixelPoint::new(x, y), VGA).unwrap();
        }
    }

    #[test]
    fn commit_closes_polygon_once_and_freezes() -> Result<()> {
        let mut editor = PolygonEditor::new();
        draw_triangle(&mut editor);
        let zone = editor.commit("press", DEFAULT_ZONE_COLOR)?.clone();

        assert_eq!(zone.points().len(), 4);
        assert_eq!(zone.points()[0], zone.points()[3]);
        assert_eq!(zone.points()[0], NormPoint::new(0.1, 0.1));
        assert!(editor.is_monitoring());
        assert!(editor.registry().is_frozen());
        assert!(editor.draft().is_empty());

        assert!(editor.commit("press", DEFAULT_ZONE_COLOR).is_err());
        assert_eq!(editor.registry().len(), 1);
        assert_eq!(editor.registry().zones()[0].points().len(), 4);
        Ok(())
    }

    #[test]
    fn commit_with_too_few_points_leaves_state_unchanged() {
        let mut editor = PolygonEditor::new();
        editor.add_point(PixelPoint::new(10.0, 10.0), VGA).unwrap();
        editor.add_point(PixelPoint::new(100.0, 10.0), VGA).unwrap();
        editor.add_point(PixelPoint::new(10.0, 10.0), VGA).unwrap();

        let err = editor.commit("bay", DEFAULT_ZONE_COLOR).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GeometryError>(),
            Some(&GeometryError::TooFewPoints { found: 2 })
        );
        assert_eq!(editor.phase(), EditorPhase::Drawing);
        assert_eq!(editor.draft().len(), 3);
        assert!(editor.registry().is_empty());
    }

    #[test]
    fn points_are_rejected_while_monitoring() {
        let mut editor = PolygonEditor::new();
        draw_triangle(&mut editor);
        editor.commit("press", DEFAULT_ZONE_COLOR).unwrap();
        assert!(editor.add_point(PixelPoint::new(5.0, 5.0), VGA).is_err());
        assert!(editor.undo_point().is_err());
    }

    #[test]
    fn undo_removes_last_point() -> Result<()> {
        let mut editor = PolygonEditor::new();
        draw_triangle(&mut editor);
        assert_eq!(editor.undo_point()?, Some(NormPoint::new(0.5, 0.9)));
        assert_eq!(editor.draft().len(), 2);
        Ok(())
    }

    #[test]
    fn clicks_outside_the_frame_are_rejected() {
        let mut editor = PolygonEditor::new();
        assert!(editor.add_point(PixelPoint::new(700.0, 10.0), VGA).is_err());
        assert!(editor.add_point(PixelPoint::new(10.0, 10.0), FrameSize::new(0, 0)).is_err());
        assert!(editor.draft().is_empty());
    }

    #[test]
    fn monitoring_requires_zones() {
        assert!(PolygonEditor::monitoring(ZoneRegistry::new()).is_err());
    }
}
