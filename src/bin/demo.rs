//! demo - synthetic end-to-end run for Zone Guard
//!
//! A stub camera, one square danger zone in the middle of the frame, and a
//! scripted person walking left to right across it.

use anyhow::{anyhow, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use std::time::Duration;

use zone_guard::command::install_interrupt_handler;
use zone_guard::detect::NullBackend;
use zone_guard::ingest::SyntheticSource;
use zone_guard::{
    run, AlarmConfig, AudioSettings, BackendRegistry, BoundingBox, Detection, LogAlertSink,
    MatchPolicy, Monitor, NormPoint, PolygonEditor, RunSettings, ScriptedBackend, SourceSettings,
    Zone, ZoneRegistry, DEFAULT_ZONE_COLOR,
};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds of the synthetic walk.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Ring the terminal bell on audio alerts.
    #[arg(long)]
    bell: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    let total_frames = args.seconds.saturating_mul(args.fps as u64);

    stage("build zone + scripted walk");
    let zone = Zone::new(
        "demo zone",
        vec![
            NormPoint::new(0.35, 0.3),
            NormPoint::new(0.65, 0.3),
            NormPoint::new(0.65, 0.9),
            NormPoint::new(0.35, 0.9),
        ],
        DEFAULT_ZONE_COLOR,
    )?;
    let editor = PolygonEditor::monitoring(ZoneRegistry::frozen(vec![zone]))?;
    let mut monitor = Monitor::new(editor, AlarmConfig::default(), MatchPolicy::FirstMatch);

    let mut detectors = BackendRegistry::new();
    detectors.register(NullBackend);
    detectors.register(scripted_walk(total_frames));
    detectors.set_default("scripted")?;

    stage("run monitor");
    let mut source = SyntheticSource::new(SourceSettings {
        url: "stub://demo".to_string(),
        width: WIDTH,
        height: HEIGHT,
        target_fps: args.fps,
        max_frames: Some(total_frames),
    });
    let mut sink = LogAlertSink::from_settings(&AudioSettings {
        enabled: args.bell,
        backend: "bell".to_string(),
        clip: Duration::from_millis(1000),
    })?;
    let (tx, rx) = unbounded();
    install_interrupt_handler(tx)?;

    let settings = RunSettings {
        target_fps: args.fps,
        confidence_threshold: 0.5,
        nms_threshold: 0.4,
        health_interval: Duration::from_secs(1),
    };
    let summary = run(
        &mut source,
        &detectors,
        &mut monitor,
        &mut sink,
        &rx,
        &settings,
    )?;
    drop(sink);

    println!("demo summary:");
    println!("  frames processed: {}", summary.frames);
    println!("  frames with intrusion: {}", summary.intrusion_frames);
    println!("  alarm episodes: {}", summary.alert_count);
    println!("  ended by: {:?}", summary.end);
    Ok(())
}

/// One person walking across the frame at a constant height.
fn scripted_walk(total_frames: u64) -> ScriptedBackend {
    let mut backend = ScriptedBackend::new();
    let steps = total_frames.max(1) as f32;
    for index in 0..total_frames {
        let foot_x = 20.0 + (WIDTH as f32 - 40.0) * index as f32 / steps;
        let foot_y = 360.0;
        let person = Detection::person(
            BoundingBox::new(foot_x - 25.0, foot_y - 150.0, foot_x + 25.0, foot_y),
            0.85,
        );
        backend = backend.with_span(index, index, vec![person]);
    }
    backend
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
