//! Background audio playback.
//!
//! The frame loop never waits on sound. `AudioWorker` owns a thread that
//! receives `Play`/`Stop` messages over a channel and drives an
//! `AudioBackend`. Messages are handled strictly in order, so a stop sent
//! before a play always takes effect first. The only shared state is the
//! "playing" flag.

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

/// Output device for the alert clip.
pub trait AudioBackend: Send {
    fn name(&self) -> &'static str;

    /// Begin playing the clip. Must return promptly.
    fn start(&mut self) -> Result<()>;

    /// Cut playback short.
    fn stop(&mut self);
}

/// Rings the terminal bell on stderr. Fallback tone when no richer output exists.
pub struct BellBackend;

impl BellBackend {
    /// Returns `None` when stderr is not a terminal, i.e. nothing would hear it.
    pub fn detect() -> Option<Self> {
        std::io::stderr().is_terminal().then_some(BellBackend)
    }
}

impl AudioBackend for BellBackend {
    fn name(&self) -> &'static str {
        "bell"
    }

    fn start(&mut self) -> Result<()> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }

    fn stop(&mut self) {}
}

/// No-op output used when audio is disabled or unavailable.
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn start(&mut self) -> Result<()> {
        log::debug!("audio alert suppressed (silent backend)");
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Pick a backend by configured name, degrading to silence when the device
/// is unavailable.
pub fn select_backend(name: &str) -> Result<Box<dyn AudioBackend>> {
    match name {
        "bell" => match BellBackend::detect() {
            Some(bell) => Ok(Box::new(bell)),
            None => {
                log::warn!("audio device unavailable (stderr is not a terminal); alerts will be silent");
                Ok(Box::new(SilentBackend))
            }
        },
        "silent" => Ok(Box::new(SilentBackend)),
        other => Err(anyhow!("unknown audio backend '{}'", other)),
    }
}

enum AudioCommand {
    Play,
    Stop,
    Shutdown,
}

pub struct AudioWorker {
    tx: Sender<AudioCommand>,
    playing: Arc<AtomicBool>,
    /// Set once a send fails because the worker thread has exited.
    disconnected: AtomicBool,
    handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    /// Spawn the worker. `clip` is how long one alert plays unless stopped.
    pub fn spawn(backend: Box<dyn AudioBackend>, clip: Duration) -> Result<Self> {
        let (tx, rx) = unbounded();
        let playing = Arc::new(AtomicBool::new(false));
        let flag = playing.clone();
        let handle = thread::Builder::new()
            .name("audio_alert".into())
            .spawn(move || audio_worker(rx, backend, clip, flag))?;
        Ok(Self {
            tx,
            playing,
            disconnected: AtomicBool::new(false),
            handle: Some(handle),
        })
    }

    /// Request playback. Ignored by the worker if a clip is already playing.
    pub fn play(&self) {
        self.send(AudioCommand::Play);
    }

    pub fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// False once the worker thread is known to have exited.
    pub fn is_alive(&self) -> bool {
        !self.disconnected.load(Ordering::Acquire)
    }

    fn send(&self, cmd: AudioCommand) {
        if self.tx.send(cmd).is_err() && !self.disconnected.swap(true, Ordering::AcqRel) {
            log::warn!("audio worker is gone; audio alerts are disabled");
        }
    }
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("audio worker panicked");
            }
        }
    }
}

fn audio_worker(
    rx: Receiver<AudioCommand>,
    mut backend: Box<dyn AudioBackend>,
    clip: Duration,
    playing: Arc<AtomicBool>,
) {
    log::debug!("audio worker started ({} backend)", backend.name());
    while let Ok(cmd) = rx.recv() {
        match cmd {
            AudioCommand::Play => {
                if !play_clip(&rx, backend.as_mut(), clip, &playing) {
                    break;
                }
            }
            AudioCommand::Stop => {}
            AudioCommand::Shutdown => break,
        }
    }
    playing.store(false, Ordering::Release);
    log::debug!("audio worker stopped");
}

/// Play one clip, servicing the channel while it runs. Returns false when the
/// worker should exit.
fn play_clip(
    rx: &Receiver<AudioCommand>,
    backend: &mut dyn AudioBackend,
    clip: Duration,
    playing: &AtomicBool,
) -> bool {
    playing.store(true, Ordering::Release);
    if let Err(err) = backend.start() {
        log::warn!("audio alert failed to start: {}", err);
        playing.store(false, Ordering::Release);
        return true;
    }

    let deadline = Instant::now() + clip;
    let keep_running = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(AudioCommand::Play) => continue,
            Ok(AudioCommand::Stop) => {
                backend.stop();
                break true;
            }
            Ok(AudioCommand::Shutdown) => {
                backend.stop();
                break false;
            }
            Err(RecvTimeoutError::Timeout) => break true,
            Err(RecvTimeoutError::Disconnected) => {
                backend.stop();
                break false;
            }
        }
    };
    playing.store(false, Ordering::Release);
    keep_running
}
