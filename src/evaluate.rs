//! Per-frame intrusion evaluation.
//!
//! `evaluate` is a pure function of its inputs: the same detections, frame
//! size, registry and policy always produce the same events.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::detect::Detection;
use crate::geometry::{FrameSize, NormPoint};
use crate::zone::ZoneRegistry;

/// How many zones a single detection may report per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Zones are tested in registry order; the first hit wins.
    #[default]
    FirstMatch,
    /// One event per zone containing the foot point.
    AllMatches,
}

impl FromStr for MatchPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "first_match" | "first" => Ok(MatchPolicy::FirstMatch),
            "all_matches" | "all" => Ok(MatchPolicy::AllMatches),
            other => Err(anyhow!(
                "unknown match policy '{}' (expected first_match or all_matches)",
                other
            )),
        }
    }
}

/// A detection whose foot point lies inside a zone on this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct IntrusionEvent {
    pub detection_index: usize,
    pub detection: Detection,
    pub zone_index: usize,
    pub zone_name: String,
    /// Foot point in normalized space, as tested.
    pub foot_point: NormPoint,
}

/// Produce this frame's intrusion events, ordered by detection then zone.
pub fn evaluate(
    detections: &[Detection],
    frame: FrameSize,
    registry: &ZoneRegistry,
    policy: MatchPolicy,
) -> Result<Vec<IntrusionEvent>> {
    frame.validate()?;
    let mut events = Vec::new();
    for (detection_index, detection) in detections.iter().enumerate() {
        let foot_point = detection.foot_point().normalize(frame);
        for (zone_index, zone) in registry.iter().enumerate() {
            if !zone.contains(foot_point)? {
                continue;
            }
            events.push(IntrusionEvent {
                detection_index,
                detection: detection.clone(),
                zone_index,
                zone_name: zone.name().to_string(),
                foot_point,
            });
            if policy == MatchPolicy::FirstMatch {
                break;
            }
        }
    }
    Ok(events)
}

/// Detection indices split by whether they produced an event. Derived for
/// rendering and logging; never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub safe: Vec<usize>,
    pub in_danger: Vec<usize>,
}

pub fn partition(detection_count: usize, events: &[IntrusionEvent]) -> Partition {
    let mut out = Partition::default();
    for index in 0..detection_count {
        if events.iter().any(|e| e.detection_index == index) {
            out.in_danger.push(index);
        } else {
            out.safe.push(index);
        }
    }
    out
}
