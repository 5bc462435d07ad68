//! Operator-facing alarm outputs.

pub mod audio;

use anyhow::Result;

use crate::alarm::{AlarmUpdate, AudioDecision};
use crate::config::AudioSettings;

pub use audio::{AudioBackend, AudioWorker, BellBackend, SilentBackend};

/// Where alarm decisions end up. Implementations must not block the frame loop.
pub trait AlertSink {
    /// Visual alarm indicator on or off.
    fn show_alarm(&mut self, active: bool);

    /// Start the audio clip. Ignored while a clip is already playing or muted.
    fn play_alert(&mut self);

    fn stop_alert(&mut self);

    /// Flip audio mute; returns the new muted state.
    fn toggle_muted(&mut self) -> bool;
}

/// Route one state-machine update to a sink.
pub fn dispatch(update: &AlarmUpdate, sink: &mut dyn AlertSink) {
    if update.display_changed {
        sink.show_alarm(update.display_active());
    }
    match update.audio {
        AudioDecision::Trigger => sink.play_alert(),
        AudioDecision::Stop => sink.stop_alert(),
        AudioDecision::Idle => {}
    }
}

/// Logs display transitions and hands audio to a background worker.
pub struct LogAlertSink {
    audio: Option<AudioWorker>,
    muted: bool,
}

impl LogAlertSink {
    pub fn new(audio: Option<AudioWorker>) -> Self {
        Self {
            audio,
            muted: false,
        }
    }

    pub fn from_settings(settings: &AudioSettings) -> Result<Self> {
        if !settings.enabled {
            log::info!("audio alerts disabled");
            return Ok(Self::new(None));
        }
        let backend = audio::select_backend(&settings.backend)?;
        log::info!(
            "audio alerts via {} backend ({}ms clip)",
            backend.name(),
            settings.clip.as_millis()
        );
        let worker = AudioWorker::spawn(backend, settings.clip)?;
        Ok(Self::new(Some(worker)))
    }

    /// Sink with no audio output at all.
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_alert();
        }
    }
}

impl AlertSink for LogAlertSink {
    fn show_alarm(&mut self, active: bool) {
        if active {
            log::warn!("INTRUSION DETECTED");
        } else {
            log::info!("alarm cleared");
        }
    }

    fn play_alert(&mut self) {
        if self.muted {
            return;
        }
        if let Some(worker) = &self.audio {
            worker.play();
        }
    }

    fn stop_alert(&mut self) {
        if let Some(worker) = &self.audio {
            worker.stop();
        }
    }

    fn toggle_muted(&mut self) -> bool {
        self.set_muted(!self.muted);
        log::info!("audio alerts {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }
}
