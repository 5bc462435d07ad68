//! Alarm state machine.
//!
//! Turns the raw per-frame intrusion signal into two outputs with separate
//! timing:
//!
//! - display: QUIET -> ALARMING as soon as a frame is raw-active, held for
//!   `display_hold` after the most recent raw-active frame;
//! - audio: a trigger at most once per `audio_retrigger` while raw-active,
//!   and a stop on the frame the raw signal drops.
//!
//! Time is passed in by the caller so the machine is deterministic.

use std::time::{Duration, Instant};

pub const DEFAULT_DISPLAY_HOLD: Duration = Duration::from_secs(3);
pub const DEFAULT_AUDIO_RETRIGGER: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlarmConfig {
    /// How long the visual alarm persists after the last raw-active frame.
    pub display_hold: Duration,
    /// Minimum spacing between audio triggers.
    pub audio_retrigger: Duration,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            display_hold: DEFAULT_DISPLAY_HOLD,
            audio_retrigger: DEFAULT_AUDIO_RETRIGGER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayState {
    Quiet,
    Alarming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioDecision {
    Idle,
    Trigger,
    Stop,
}

/// Result of feeding one frame into the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlarmUpdate {
    pub raw_active: bool,
    pub display: DisplayState,
    /// True when `display` differs from the previous frame.
    pub display_changed: bool,
    pub audio: AudioDecision,
}

impl AlarmUpdate {
    pub fn display_active(&self) -> bool {
        self.display == DisplayState::Alarming
    }
}

#[derive(Clone, Debug)]
pub struct AlarmState {
    config: AlarmConfig,
    raw_active: bool,
    display_active: bool,
    last_raw_active: Option<Instant>,
    last_audio_trigger: Option<Instant>,
    alert_count: u64,
}

impl AlarmState {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            raw_active: false,
            display_active: false,
            last_raw_active: None,
            last_audio_trigger: None,
            alert_count: 0,
        }
    }

    pub fn update(&mut self, raw_active: bool, now: Instant) -> AlarmUpdate {
        let was_raw = self.raw_active;
        let was_display = self.display_active;

        self.raw_active = raw_active;
        if raw_active {
            self.last_raw_active = Some(now);
        }

        self.display_active = raw_active
            || self
                .last_raw_active
                .is_some_and(|t| now.saturating_duration_since(t) < self.config.display_hold);
        if self.display_active && !was_display {
            self.alert_count += 1;
        }

        let audio = if raw_active {
            let cooled = self
                .last_audio_trigger
                .is_none_or(|t| now.saturating_duration_since(t) > self.config.audio_retrigger);
            if cooled {
                self.last_audio_trigger = Some(now);
                AudioDecision::Trigger
            } else {
                AudioDecision::Idle
            }
        } else if was_raw {
            AudioDecision::Stop
        } else {
            AudioDecision::Idle
        };

        AlarmUpdate {
            raw_active,
            display: if self.display_active {
                DisplayState::Alarming
            } else {
                DisplayState::Quiet
            },
            display_changed: self.display_active != was_display,
            audio,
        }
    }

    pub fn config(&self) -> AlarmConfig {
        self.config
    }

    pub fn raw_active(&self) -> bool {
        self.raw_active
    }

    pub fn display_active(&self) -> bool {
        self.display_active
    }

    pub fn last_raw_active(&self) -> Option<Instant> {
        self.last_raw_active
    }

    /// Number of QUIET -> ALARMING transitions since start or the last reset.
    pub fn alert_count(&self) -> u64 {
        self.alert_count
    }

    pub fn reset_alert_count(&mut self) {
        self.alert_count = 0;
    }

    /// Back to the initial state, keeping the configured durations.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

impl Default for AlarmState {
    fn default() -> Self {
        Self::new(AlarmConfig::default())
    }
}
