//! Per-frame orchestration: operator commands, detection, evaluation, alarm.

use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{Receiver, TryRecvError};

use crate::alarm::{AlarmConfig, AlarmState, AlarmUpdate};
use crate::alert::{dispatch, AlertSink};
use crate::command::OperatorCommand;
use crate::config::MonitorConfig;
use crate::detect::{detect_people, non_max_suppression, BackendRegistry, Detection};
use crate::editor::PolygonEditor;
use crate::evaluate::{evaluate, partition, IntrusionEvent, MatchPolicy, Partition};
use crate::geometry::FrameSize;
use crate::ingest::FrameSource;
use crate::zone::DEFAULT_ZONE_COLOR;

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(5);

/// Everything one frame produced.
#[derive(Clone, Debug)]
pub struct FrameOutcome {
    pub events: Vec<IntrusionEvent>,
    pub partition: Partition,
    pub alarm: AlarmUpdate,
}

impl FrameOutcome {
    pub fn raw_active(&self) -> bool {
        !self.events.is_empty()
    }
}

#[derive(Debug)]
pub struct Monitor {
    editor: PolygonEditor,
    alarm: AlarmState,
    policy: MatchPolicy,
}

impl Monitor {
    pub fn new(editor: PolygonEditor, alarm: AlarmConfig, policy: MatchPolicy) -> Self {
        Self {
            editor,
            alarm: AlarmState::new(alarm),
            policy,
        }
    }

    /// Configured zones put the monitor straight into MONITORING; otherwise
    /// the operator draws one first.
    pub fn from_config(cfg: &MonitorConfig) -> Result<Self> {
        let editor = if cfg.zones.is_empty() {
            PolygonEditor::new()
        } else {
            PolygonEditor::monitoring(cfg.zone_registry()?)?
        };
        Ok(Self::new(
            editor,
            cfg.alarm_config(),
            cfg.alarm.match_policy,
        ))
    }

    pub fn editor(&self) -> &PolygonEditor {
        &self.editor
    }

    pub fn alarm(&self) -> &AlarmState {
        &self.alarm
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn is_monitoring(&self) -> bool {
        self.editor.is_monitoring()
    }

    pub fn status(&self) -> &'static str {
        self.editor.phase().status()
    }

    /// Evaluate one frame's detections and advance the alarm.
    ///
    /// While drawing nothing is evaluated and the raw signal is false.
    pub fn process(
        &mut self,
        detections: &[Detection],
        frame: FrameSize,
        now: Instant,
    ) -> Result<FrameOutcome> {
        let events = if self.editor.is_monitoring() {
            evaluate(detections, frame, self.editor.registry(), self.policy)?
        } else {
            Vec::new()
        };
        let alarm = self.alarm.update(!events.is_empty(), now);
        Ok(FrameOutcome {
            partition: partition(detections.len(), &events),
            events,
            alarm,
        })
    }

    /// Apply an operator command. Rejected edits are logged and leave state
    /// unchanged; only `Quit` breaks.
    pub fn handle_command(
        &mut self,
        cmd: OperatorCommand,
        frame: FrameSize,
        sink: &mut dyn AlertSink,
    ) -> ControlFlow<()> {
        match cmd {
            OperatorCommand::AddPoint(click) => match self.editor.add_point(click, frame) {
                Ok(()) => log::info!(
                    "point ({:.0}, {:.0}) added; {} in draft",
                    click.x,
                    click.y,
                    self.editor.draft().len()
                ),
                Err(err) => log::warn!("point rejected: {}", err),
            },
            OperatorCommand::UndoPoint => match self.editor.undo_point() {
                Ok(Some(_)) => log::info!("last point removed; {} in draft", self.editor.draft().len()),
                Ok(None) => log::info!("nothing to undo"),
                Err(err) => log::warn!("undo rejected: {}", err),
            },
            OperatorCommand::Commit(name) => {
                let name =
                    name.unwrap_or_else(|| format!("zone {}", self.editor.registry().len() + 1));
                match self.editor.commit(&name, DEFAULT_ZONE_COLOR) {
                    Ok(zone) => {
                        log::info!(
                            "zone '{}' committed with {} vertices",
                            zone.name(),
                            zone.vertex_count()
                        );
                        log::info!("status: {}", self.status());
                    }
                    Err(err) => log::warn!("zone commit rejected: {}", err),
                }
            }
            OperatorCommand::ResetAlertCount => {
                self.alarm.reset_alert_count();
                log::info!("alert count reset");
            }
            OperatorCommand::ToggleAudio => {
                sink.toggle_muted();
            }
            OperatorCommand::Quit => {
                log::info!("quit requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Frames per second over one-second windows.
#[derive(Clone, Debug, Default)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame; returns the most recent full-window rate.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = Some(now);
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[derive(Clone, Debug)]
pub struct RunSettings {
    /// Loop pacing; 0 runs as fast as the source delivers.
    pub target_fps: u32,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub health_interval: Duration,
}

impl RunSettings {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self {
            target_fps: cfg.source.target_fps,
            confidence_threshold: cfg.detector.confidence_threshold,
            nms_threshold: cfg.detector.nms_threshold,
            health_interval: DEFAULT_HEALTH_INTERVAL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEnd {
    Quit,
    EndOfStream,
    SourceFailed(String),
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames: u64,
    /// Frames with at least one intrusion event.
    pub intrusion_frames: u64,
    pub alert_count: u64,
    pub end: RunEnd,
}

/// Drive the monitor until quit, end of stream, or a source failure.
///
/// Detector errors are returned; a failed source ends the run normally with
/// `RunEnd::SourceFailed`.
pub fn run(
    source: &mut dyn FrameSource,
    detectors: &BackendRegistry,
    monitor: &mut Monitor,
    sink: &mut dyn AlertSink,
    commands: &Receiver<OperatorCommand>,
    settings: &RunSettings,
) -> Result<RunSummary> {
    let frame_budget = (settings.target_fps > 0)
        .then(|| Duration::from_secs_f64(1.0 / settings.target_fps as f64));
    let mut fps = FpsCounter::new();
    let mut frames = 0u64;
    let mut intrusion_frames = 0u64;
    let mut last_health_log = Instant::now();
    let mut commands_open = true;

    log::info!("status: {}", monitor.status());

    let end = loop {
        let started = Instant::now();

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("source reached end of stream");
                break RunEnd::EndOfStream;
            }
            Err(err) => {
                log::error!("frame source failed: {:#}", err);
                break RunEnd::SourceFailed(format!("{:#}", err));
            }
        };
        let size = frame.size();

        let mut quit = false;
        while commands_open {
            match commands.try_recv() {
                Ok(cmd) => {
                    if monitor.handle_command(cmd, size, sink).is_break() {
                        quit = true;
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => commands_open = false,
            }
        }
        if quit {
            break RunEnd::Quit;
        }

        let detections = if monitor.is_monitoring() {
            let raw = detectors.detect(&frame)?;
            non_max_suppression(
                detect_people(raw, settings.confidence_threshold),
                settings.nms_threshold,
            )
        } else {
            Vec::new()
        };

        let outcome = monitor.process(&detections, size, Instant::now())?;
        dispatch(&outcome.alarm, sink);
        frames += 1;
        if outcome.raw_active() {
            intrusion_frames += 1;
            for event in &outcome.events {
                log::debug!(
                    "frame {}: detection {} ({:.2}) in zone '{}' at ({:.3}, {:.3})",
                    frame.index,
                    event.detection_index,
                    event.detection.confidence,
                    event.zone_name,
                    event.foot_point.x,
                    event.foot_point.y
                );
            }
        }

        let rate = fps.tick(Instant::now());
        if last_health_log.elapsed() >= settings.health_interval {
            let stats = source.stats();
            log::info!(
                "health source={} frames={} url={} fps={:.1} alarm={} alerts={} status={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.url,
                rate,
                monitor.alarm().display_active(),
                monitor.alarm().alert_count(),
                monitor.status()
            );
            last_health_log = Instant::now();
        }

        if let Some(budget) = frame_budget {
            let spent = started.elapsed();
            if spent < budget {
                thread::sleep(budget - spent);
            }
        }
    };

    sink.stop_alert();
    Ok(RunSummary {
        frames,
        intrusion_frames,
        alert_count: monitor.alarm().alert_count(),
        end,
    })
}
