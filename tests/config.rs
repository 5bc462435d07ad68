use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use zone_guard::config::MonitorConfig;
use zone_guard::{MatchPolicy, NormPoint, PolygonEditor};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ZONE_GUARD_CONFIG",
        "ZONE_GUARD_SOURCE_URL",
        "ZONE_GUARD_DETECTOR",
        "ZONE_GUARD_MODEL_PATH",
        "ZONE_GUARD_DISPLAY_HOLD_MS",
        "ZONE_GUARD_AUDIO_RETRIGGER_MS",
        "ZONE_GUARD_MATCH_POLICY",
        "ZONE_GUARD_AUDIO",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(body.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load defaults");
    assert_eq!(cfg.source.url, "stub://camera");
    assert_eq!((cfg.source.width, cfg.source.height), (640, 480));
    assert_eq!(cfg.source.target_fps, 10);
    assert_eq!(cfg.detector.backend, "none");
    assert_eq!(cfg.detector.confidence_threshold, 0.5);
    assert_eq!(cfg.detector.nms_threshold, 0.4);
    assert_eq!(cfg.alarm.display_hold, Duration::from_secs(3));
    assert_eq!(cfg.alarm.audio_retrigger, Duration::from_secs(3));
    assert_eq!(cfg.alarm.match_policy, MatchPolicy::FirstMatch);
    assert!(cfg.audio.enabled);
    assert_eq!(cfg.audio.backend, "bell");
    assert_eq!(cfg.audio.clip, Duration::from_millis(1000));
    assert!(cfg.zones.is_empty());
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{
            "source": {
                "url": "raw:/var/lib/zone-guard/camera.rgb",
                "width": 800,
                "height": 600,
                "target_fps": 15
            },
            "detector": {
                "backend": "scripted",
                "script_path": "walk.jsonl",
                "confidence_threshold": 0.6
            },
            "alarm": {
                "display_hold_ms": 2000,
                "audio_retrigger_ms": 5000
            },
            "zones": {
                "press line": {
                    "points": [[0.1, 0.1], [0.5, 0.1], [0.5, 0.5], [0.1, 0.5]],
                    "color": [0, 255, 0]
                },
                "aisle": {
                    "points": [[0.6, 0.6], [0.9, 0.6], [0.9, 0.9]]
                }
            }
        }"#,
    );

    std::env::set_var("ZONE_GUARD_CONFIG", file.path());
    std::env::set_var("ZONE_GUARD_DISPLAY_HOLD_MS", "1500");
    std::env::set_var("ZONE_GUARD_MATCH_POLICY", "all_matches");
    std::env::set_var("ZONE_GUARD_AUDIO", "off");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.source.url, "raw:/var/lib/zone-guard/camera.rgb");
    assert_eq!(cfg.source.frame_size().width, 800);
    assert_eq!(cfg.source.target_fps, 15);
    assert_eq!(cfg.detector.backend, "scripted");
    assert_eq!(cfg.detector.confidence_threshold, 0.6);
    assert_eq!(cfg.detector.nms_threshold, 0.4);
    assert_eq!(cfg.alarm.display_hold, Duration::from_millis(1500));
    assert_eq!(cfg.alarm.audio_retrigger, Duration::from_millis(5000));
    assert_eq!(cfg.alarm.match_policy, MatchPolicy::AllMatches);
    assert!(!cfg.audio.enabled);

    let names: Vec<&str> = cfg.zones.iter().map(|z| z.name()).collect();
    assert_eq!(names, vec!["press line", "aisle"]);
    assert_eq!(cfg.zones[0].color(), [0, 255, 0]);
    assert_eq!(cfg.zones[1].color(), [255, 0, 0]);
    assert_eq!(cfg.zones[1].points()[2], NormPoint::new(0.9, 0.9));

    let registry = cfg.zone_registry().expect("registry");
    assert_eq!(registry.len(), 2);
    assert!(!registry.is_frozen());
    assert_eq!(cfg.alarm_config().display_hold, Duration::from_millis(1500));

    // Loaded rings are open until monitoring freezes them.
    assert_eq!(registry.zones()[1].points().len(), 3);
    let editor = PolygonEditor::monitoring(registry).expect("monitoring");
    let aisle = &editor.registry().zones()[1];
    assert_eq!(aisle.points().len(), 4);
    assert_eq!(aisle.points()[3], NormPoint::new(0.6, 0.6));
    assert_eq!(aisle.vertex_count(), 3);

    clear_env();
}

#[test]
fn loads_toml_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".toml",
        r#"
[source]
url = "stub://yard"
max_frames = 25

[alarm]
match_policy = "first_match"

[audio]
backend = "silent"
clip_ms = 250

[zones.gate]
points = [[0.2, 0.2], [0.8, 0.2], [0.8, 0.8], [0.2, 0.8]]

[zones.dock]
points = [[0.0, 0.0], [0.1, 0.0], [0.1, 0.1]]
color = [0, 0, 255]
"#,
    );

    let cfg = MonitorConfig::load_from(Some(file.path())).expect("load toml");
    assert_eq!(cfg.source.url, "stub://yard");
    assert_eq!(cfg.source.max_frames, Some(25));
    assert_eq!(cfg.audio.backend, "silent");
    assert_eq!(cfg.audio.clip, Duration::from_millis(250));
    let names: Vec<&str> = cfg.zones.iter().map(|z| z.name()).collect();
    assert_eq!(names, vec!["gate", "dock"]);
    assert_eq!(cfg.zones[1].color(), [0, 0, 255]);

    clear_env();
}

#[test]
fn rejects_invalid_zones_and_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let degenerate = write_config(
        ".json",
        r#"{ "zones": { "line": { "points": [[0.1, 0.1], [0.5, 0.5]] } } }"#,
    );
    let err = MonitorConfig::load_from(Some(degenerate.path())).unwrap_err();
    assert!(format!("{:#}", err).contains("line"), "{:#}", err);

    let repeated = write_config(
        ".json",
        r#"{ "zones": {
            "bay": { "points": [[0.1, 0.1], [0.4, 0.1], [0.4, 0.4], [0.1, 0.4]] },
            "bay": { "points": [[0.6, 0.6], [0.9, 0.6], [0.9, 0.9], [0.6, 0.9]] }
        } }"#,
    );
    let err = MonitorConfig::load_from(Some(repeated.path())).unwrap_err();
    assert!(
        format!("{:#}", err).contains(r#"duplicate zone name "bay""#),
        "{:#}",
        err
    );

    let out_of_frame = write_config(
        ".json",
        r#"{ "zones": { "roof": { "points": [[0.1, 0.1], [1.5, 0.1], [0.5, 0.5]] } } }"#,
    );
    assert!(MonitorConfig::load_from(Some(out_of_frame.path())).is_err());

    let bad_detector = write_config(".json", r#"{ "detector": { "backend": "magic" } }"#);
    assert!(MonitorConfig::load_from(Some(bad_detector.path())).is_err());

    let zero_size = write_config(".json", r#"{ "source": { "width": 0 } }"#);
    assert!(MonitorConfig::load_from(Some(zero_size.path())).is_err());

    std::env::set_var("ZONE_GUARD_AUDIO_RETRIGGER_MS", "soon");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("ZONE_GUARD_SOURCE_URL", "rtsp://camera-1/stream");
    assert!(MonitorConfig::load().is_err());

    clear_env();
}
