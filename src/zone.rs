//! Danger zones and the registry that holds them.
//!
//! Zones are stored in normalized space so they stay valid across resolution
//! changes. The registry has an authoring phase (zones may be pushed) and a
//! frozen phase (read-only for the rest of the run). Freezing closes every
//! ring, so a monitored zone always ends with a copy of its first point.

use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::geometry::{self, distinct_point_count, polygon_area, GeometryError, NormPoint};

/// Display color as an RGB triple.
pub type Rgb = [u8; 3];

pub const DEFAULT_ZONE_COLOR: Rgb = [255, 0, 0];

/// Zone names are operator-facing labels; keep them printable and short.
///
/// Allowed: "loading bay", "press_2", "north-gate.inner"
pub fn validate_zone_name(name: &str) -> Result<()> {
    static ZONE_NAME_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = ZONE_NAME_RE.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z0-9 _.-]{1,64}$").expect("zone name regex is valid")
    });
    if !re.is_match(name) || name.trim().is_empty() {
        return Err(anyhow!(
            "zone name {:?} must match ^[A-Za-z0-9 _.-]{{1,64}}$",
            name
        ));
    }
    Ok(())
}

/// Operator-defined polygon marking a restricted area.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    name: String,
    points: Vec<NormPoint>,
    color: Rgb,
}

impl Zone {
    /// Build a zone, rejecting anything that cannot be evaluated: fewer than
    /// three distinct vertices, vertices outside `[0, 1]`, or zero area.
    pub fn new(name: &str, points: Vec<NormPoint>, color: Rgb) -> Result<Self> {
        validate_zone_name(name)?;
        if let Some(bad) = points.iter().find(|p| !p.is_finite() || !p.in_unit_square()) {
            return Err(GeometryError::OutOfBounds { x: bad.x, y: bad.y }.into());
        }
        let distinct = distinct_point_count(&points);
        if distinct < 3 {
            return Err(GeometryError::TooFewPoints { found: distinct }.into());
        }
        if polygon_area(&points) <= f32::EPSILON {
            return Err(GeometryError::ZeroArea.into());
        }
        Ok(Self {
            name: name.to_string(),
            points,
            color,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertices in drawing order. Closed (last == first) once the zone is in
    /// a frozen registry.
    pub fn points(&self) -> &[NormPoint] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }

    /// Number of polygon corners, not counting the closing point.
    pub fn vertex_count(&self) -> usize {
        if self.is_closed() {
            self.points.len() - 1
        } else {
            self.points.len()
        }
    }

    fn close(&mut self) {
        if !self.is_closed() {
            if let Some(&first) = self.points.first() {
                self.points.push(first);
            }
        }
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Containment of a point already converted to normalized space.
    pub fn contains(&self, point: NormPoint) -> Result<bool, GeometryError> {
        geometry::contains(&self.points, point)
    }
}

/// One zone entry as written in configuration files:
/// `{"points": [[x, y], ...], "color": [r, g, b]}`.
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneSpec {
    pub points: Vec<[f32; 2]>,
    #[serde(default)]
    pub color: Option<Rgb>,
}

impl ZoneSpec {
    pub fn into_zone(self, name: &str) -> Result<Zone> {
        let points = self
            .points
            .into_iter()
            .map(|[x, y]| NormPoint::new(x, y))
            .collect();
        Zone::new(name, points, self.color.unwrap_or(DEFAULT_ZONE_COLOR))
            .with_context(|| format!("zone {:?} rejected", name))
    }
}

/// Ordered set of configured zones. Registry order is evaluation order.
#[derive(Clone, Debug, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    frozen: bool,
}

impl ZoneRegistry {
    /// Empty registry in the authoring phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `zones` in the given order, already frozen.
    pub fn frozen(zones: Vec<Zone>) -> Self {
        let mut registry = Self {
            zones,
            frozen: false,
        };
        registry.freeze();
        registry
    }

    pub fn push(&mut self, zone: Zone) -> Result<()> {
        if self.frozen {
            return Err(anyhow!(
                "zone registry is frozen; cannot add zone {:?}",
                zone.name()
            ));
        }
        if self.zones.iter().any(|z| z.name() == zone.name()) {
            return Err(anyhow!("duplicate zone name {:?}", zone.name()));
        }
        self.zones.push(zone);
        Ok(())
    }

    /// One-way transition to read-only. Closes each zone's ring exactly once.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        for zone in &mut self.zones {
            zone.close();
        }
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, index: usize) -> Option<&Zone> {
        self.zones.get(index)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }
}
