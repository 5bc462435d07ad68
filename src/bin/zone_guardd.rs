//! zone-guardd - danger-zone intrusion monitor
//!
//! This daemon:
//! 1. Loads configuration (file, environment, command line)
//! 2. Opens the frame source and the configured detector backend
//! 3. Lets the operator draw a zone on stdin unless zones are configured
//! 4. Evaluates every frame and drives the alarm and audio alerts

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::unbounded;
use std::path::PathBuf;

use zone_guard::command::{install_interrupt_handler, spawn_stdin_reader};
use zone_guard::{
    build_registry, open_source, run, LogAlertSink, Monitor, MonitorConfig, RunEnd, RunSettings,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file (JSON, or TOML when the extension is .toml).
    #[arg(long, env = "ZONE_GUARD_CONFIG")]
    config: Option<PathBuf>,
    /// Frame source: stub://<name> or raw:<path>.
    #[arg(long)]
    source: Option<String>,
    /// Detector backend: none, scripted or tract.
    #[arg(long)]
    detector: Option<String>,
    /// Detection script for the scripted backend (JSON lines).
    #[arg(long)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = MonitorConfig::load_from(args.config.as_deref())?;
    if let Some(url) = args.source {
        cfg.source.url = url;
    }
    if let Some(script) = args.script {
        cfg.detector.script_path = Some(script);
        if args.detector.is_none() {
            cfg.detector.backend = "scripted".to_string();
        }
    }
    if let Some(backend) = args.detector {
        cfg.detector.backend = backend;
    }
    cfg.validate()?;

    let detectors = build_registry(&cfg.detector)?;
    detectors.warm_up_all()?;
    log::info!(
        "detector backends: {} (using {})",
        detectors.list().join(", "),
        detectors.default_name().unwrap_or("none")
    );

    let mut source = open_source(&cfg.source)?;
    source.connect()?;

    let mut sink = LogAlertSink::from_settings(&cfg.audio)?;
    let mut monitor = Monitor::from_config(&cfg)?;
    if monitor.is_monitoring() {
        log::info!(
            "monitoring {} configured zone(s), match policy {:?}",
            monitor.editor().registry().len(),
            monitor.policy()
        );
    } else {
        log::info!(
            "no zones configured: add points with `point <x> <y>` ({}), then `commit [name]`",
            cfg.source.frame_size()
        );
    }

    let (tx, rx) = unbounded();
    install_interrupt_handler(tx.clone())?;
    let _stdin = spawn_stdin_reader(tx)?;

    let settings = RunSettings::from_config(&cfg);
    let summary = run(
        source.as_mut(),
        &detectors,
        &mut monitor,
        &mut sink,
        &rx,
        &settings,
    )?;

    log::info!(
        "zone-guardd stopped: frames={} intrusion_frames={} alerts={} end={:?}",
        summary.frames,
        summary.intrusion_frames,
        summary.alert_count,
        summary.end
    );
    if let RunEnd::SourceFailed(reason) = &summary.end {
        log::warn!("source failure ended monitoring: {}", reason);
    }
    drop(sink);
    Ok(())
}
