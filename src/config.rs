use anyhow::{anyhow, Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::alarm::AlarmConfig;
use crate::detect::backends::KNOWN_BACKENDS;
use crate::evaluate::MatchPolicy;
use crate::geometry::FrameSize;
use crate::zone::{Zone, ZoneRegistry, ZoneSpec};

const DEFAULT_SOURCE_URL: &str = "stub://camera";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_DETECTOR: &str = "none";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_NMS_THRESHOLD: f32 = 0.4;
const DEFAULT_MODEL_INPUT: u32 = 640;
const DEFAULT_DISPLAY_HOLD_MS: u64 = 3000;
const DEFAULT_AUDIO_RETRIGGER_MS: u64 = 3000;
const DEFAULT_AUDIO_BACKEND: &str = "bell";
const DEFAULT_AUDIO_CLIP_MS: u64 = 1000;
const AUDIO_BACKENDS: &[&str] = &["bell", "silent"];

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    alarm: Option<AlarmConfigFile>,
    audio: Option<AudioConfigFile>,
    /// Name -> zone, in file order.
    #[serde(default, deserialize_with = "zone_entries")]
    zones: Vec<(String, ZoneSpec)>,
}

/// Read the `zones` table as ordered entries. A plain map would keep only the
/// last of two zones sharing a name, so repeats are rejected here.
fn zone_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, ZoneSpec)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ZoneEntries;

    impl<'de> Visitor<'de> for ZoneEntries {
        type Value = Vec<(String, ZoneSpec)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a table of zone name to zone")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: Vec<(String, ZoneSpec)> = Vec::new();
            while let Some(name) = map.next_key::<String>()? {
                if entries.iter().any(|(seen, _)| *seen == name) {
                    return Err(de::Error::custom(format!("duplicate zone name {:?}", name)));
                }
                let spec = map
                    .next_value::<ZoneSpec>()
                    .map_err(|e| de::Error::custom(format!("invalid zone {:?}: {}", name, e)))?;
                entries.push((name, spec));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(ZoneEntries)
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    script_path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    nms_threshold: Option<f32>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlarmConfigFile {
    display_hold_ms: Option<u64>,
    audio_retrigger_ms: Option<u64>,
    match_policy: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AudioConfigFile {
    enabled: Option<bool>,
    backend: Option<String>,
    clip_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub alarm: AlarmSettings,
    pub audio: AudioSettings,
    /// Zones from the configuration file, in file order. Empty means the
    /// operator draws one at startup.
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    /// Stop after this many frames (synthetic sources only).
    pub max_frames: Option<u64>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            width: DEFAULT_SOURCE_WIDTH,
            height: DEFAULT_SOURCE_HEIGHT,
            target_fps: DEFAULT_SOURCE_FPS,
            max_frames: None,
        }
    }
}

impl SourceSettings {
    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    /// Model input resolution.
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_DETECTOR.to_string(),
            model_path: None,
            script_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            input_width: DEFAULT_MODEL_INPUT,
            input_height: DEFAULT_MODEL_INPUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSettings {
    pub display_hold: Duration,
    pub audio_retrigger: Duration,
    pub match_policy: MatchPolicy,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            display_hold: Duration::from_millis(DEFAULT_DISPLAY_HOLD_MS),
            audio_retrigger: Duration::from_millis(DEFAULT_AUDIO_RETRIGGER_MS),
            match_policy: MatchPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioSettings {
    pub enabled: bool,
    pub backend: String,
    pub clip: Duration,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: DEFAULT_AUDIO_BACKEND.to_string(),
            clip: Duration::from_millis(DEFAULT_AUDIO_CLIP_MS),
        }
    }
}

impl MonitorConfig {
    /// Load from `ZONE_GUARD_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ZONE_GUARD_CONFIG")
            .ok()
            .filter(|path| !path.trim().is_empty());
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Same as `load` but with an explicit file path, e.g. from `--config`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => MonitorConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            url: source_file
                .url
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            max_frames: source_file.max_frames,
        };

        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or_else(|| DEFAULT_DETECTOR.to_string()),
            model_path: detector_file.model_path,
            script_path: detector_file.script_path,
            confidence_threshold: detector_file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            nms_threshold: detector_file.nms_threshold.unwrap_or(DEFAULT_NMS_THRESHOLD),
            input_width: detector_file.input_width.unwrap_or(DEFAULT_MODEL_INPUT),
            input_height: detector_file.input_height.unwrap_or(DEFAULT_MODEL_INPUT),
        };

        let alarm_file = file.alarm.unwrap_or_default();
        let match_policy = match alarm_file.match_policy {
            Some(policy) => policy.parse()?,
            None => MatchPolicy::default(),
        };
        let alarm = AlarmSettings {
            display_hold: Duration::from_millis(
                alarm_file.display_hold_ms.unwrap_or(DEFAULT_DISPLAY_HOLD_MS),
            ),
            audio_retrigger: Duration::from_millis(
                alarm_file
                    .audio_retrigger_ms
                    .unwrap_or(DEFAULT_AUDIO_RETRIGGER_MS),
            ),
            match_policy,
        };

        let audio_file = file.audio.unwrap_or_default();
        let audio = AudioSettings {
            enabled: audio_file.enabled.unwrap_or(true),
            backend: audio_file
                .backend
                .unwrap_or_else(|| DEFAULT_AUDIO_BACKEND.to_string()),
            clip: Duration::from_millis(audio_file.clip_ms.unwrap_or(DEFAULT_AUDIO_CLIP_MS)),
        };

        let mut zones = Vec::new();
        for (name, spec) in file.zones {
            zones.push(spec.into_zone(&name)?);
        }

        Ok(Self {
            source,
            detector,
            alarm,
            audio,
            zones,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("ZONE_GUARD_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(backend) = std::env::var("ZONE_GUARD_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("ZONE_GUARD_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(hold) = std::env::var("ZONE_GUARD_DISPLAY_HOLD_MS") {
            self.alarm.display_hold = parse_millis("ZONE_GUARD_DISPLAY_HOLD_MS", &hold)?;
        }
        if let Ok(retrigger) = std::env::var("ZONE_GUARD_AUDIO_RETRIGGER_MS") {
            self.alarm.audio_retrigger =
                parse_millis("ZONE_GUARD_AUDIO_RETRIGGER_MS", &retrigger)?;
        }
        if let Ok(policy) = std::env::var("ZONE_GUARD_MATCH_POLICY") {
            if !policy.trim().is_empty() {
                self.alarm.match_policy = policy.parse()?;
            }
        }
        if let Ok(audio) = std::env::var("ZONE_GUARD_AUDIO") {
            self.audio.enabled = parse_switch("ZONE_GUARD_AUDIO", &audio)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.source.frame_size().validate()?;
        if !self.source.url.starts_with("stub://") && !self.source.url.starts_with("raw:") {
            return Err(anyhow!(
                "source url must be stub://<name> or raw:<path>, got '{}'",
                self.source.url
            ));
        }
        if !KNOWN_BACKENDS.contains(&self.detector.backend.as_str()) {
            return Err(anyhow!(
                "unknown detector backend '{}' (expected one of {})",
                self.detector.backend,
                KNOWN_BACKENDS.join(", ")
            ));
        }
        check_unit("detector.confidence_threshold", self.detector.confidence_threshold)?;
        check_unit("detector.nms_threshold", self.detector.nms_threshold)?;
        if self.detector.input_width == 0 || self.detector.input_height == 0 {
            return Err(anyhow!("detector input size must be non-zero"));
        }
        if !AUDIO_BACKENDS.contains(&self.audio.backend.as_str()) {
            return Err(anyhow!(
                "unknown audio backend '{}' (expected one of {})",
                self.audio.backend,
                AUDIO_BACKENDS.join(", ")
            ));
        }
        if self.audio.clip.is_zero() {
            return Err(anyhow!("audio clip length must be greater than zero"));
        }
        Ok(())
    }

    /// Registry of the configured zones, unfrozen.
    pub fn zone_registry(&self) -> Result<ZoneRegistry> {
        let mut registry = ZoneRegistry::new();
        for zone in &self.zones {
            registry.push(zone.clone())?;
        }
        Ok(registry)
    }

    pub fn alarm_config(&self) -> AlarmConfig {
        AlarmConfig {
            display_hold: self.alarm.display_hold,
            audio_retrigger: self.alarm.audio_retrigger,
        }
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn parse_millis(var: &str, value: &str) -> Result<Duration> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{} must be an integer number of milliseconds", var))?;
    Ok(Duration::from_millis(millis))
}

fn parse_switch(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(anyhow!("{} must be on or off", var)),
    }
}

fn check_unit(field: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{} must be within [0, 1], got {}", field, value));
    }
    Ok(())
}
