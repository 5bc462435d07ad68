//! Zone Guard
//!
//! Danger-zone intrusion monitoring for a live video feed. An operator marks
//! one or more polygonal zones on the camera image; every frame, detected
//! people are reduced to a ground-contact foot point and tested against the
//! zones, and a debounced alarm drives visual and audio alerts.
//!
//! # Pipeline
//!
//! ```text
//! FrameSource -> DetectorBackend -> detect_people/NMS -> evaluate -> AlarmState -> AlertSink
//!                                                          ^
//!                                      PolygonEditor/ZoneRegistry (operator commands)
//! ```
//!
//! # Module Structure
//!
//! - `geometry`: pixel vs normalized points, point-in-polygon
//! - `zone`: validated zones and the registry
//! - `editor`: DRAWING -> MONITORING zone authoring
//! - `evaluate`: per-frame intrusion events
//! - `alarm`: display hold and audio cool-down
//! - `alert`: sinks and the background audio worker
//! - `detect`, `ingest`, `frame`: detector backends and frame sources
//! - `monitor`, `command`, `config`: the run loop and its inputs

pub mod alarm;
pub mod alert;
pub mod command;
pub mod config;
pub mod detect;
pub mod editor;
pub mod evaluate;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod monitor;
pub mod zone;

pub use alarm::{AlarmConfig, AlarmState, AlarmUpdate, AudioDecision, DisplayState};
pub use alert::{dispatch, AlertSink, AudioWorker, LogAlertSink};
pub use command::OperatorCommand;
pub use config::{AlarmSettings, AudioSettings, DetectorSettings, MonitorConfig, SourceSettings};
pub use detect::{
    build_registry, detect_people, non_max_suppression, BackendRegistry, BoundingBox, Detection,
    DetectorBackend, ObjectClass, ScriptedBackend,
};
pub use editor::{EditorPhase, PolygonEditor};
pub use evaluate::{evaluate, partition, IntrusionEvent, MatchPolicy, Partition};
pub use frame::Frame;
pub use geometry::{contains, FrameSize, GeometryError, NormPoint, PixelPoint};
pub use ingest::{open_source, FrameSource, SourceStats};
pub use monitor::{run, FpsCounter, FrameOutcome, Monitor, RunEnd, RunSettings, RunSummary};
pub use zone::{Rgb, Zone, ZoneRegistry, ZoneSpec, DEFAULT_ZONE_COLOR};
