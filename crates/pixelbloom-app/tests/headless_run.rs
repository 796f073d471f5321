use std::fs::File;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use pixelbloom_app::{
    DEFAULT_BACKGROUND, HeadlessOptions, HeadlessReport, export_png, import_png, run_headless,
};
use pixelbloom_core::{Engine, EngineConfig, PatternParams, Rule, SchedulerConfig, Session};
use tempfile::tempdir;

#[test]
fn binary_writes_report_and_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let report_path = dir.path().join("out/report.json");
    let snapshot_path = dir.path().join("out/final.png");
    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{"rows": 24, "cols": 30, "rng_seed": 7, "params": {"spread_probability": 0.6}}"#,
    )?;

    let status = Command::new(env!("CARGO_BIN_EXE_pixelbloom"))
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .args(["--rule", "tendrils", "--steps", "20", "--seconds", "60"])
        .args(["--cell-size", "3"])
        .arg("--report")
        .arg(&report_path)
        .arg("--snapshot")
        .arg(&snapshot_path)
        .env("RUST_LOG", "off")
        .status()?;
    assert!(status.success(), "headless run failed");

    let report: HeadlessReport = serde_json::from_reader(File::open(&report_path)?)?;
    assert_eq!(report.summary.spread_steps, 20);
    assert_eq!(report.frames.len(), 20);
    assert!(report.frames.iter().all(|frame| frame.rule == Rule::Tendrils));
    assert_eq!(report.summary.final_tick, 20);

    let snapshot = image::open(&snapshot_path)?.to_rgba8();
    assert_eq!(snapshot.dimensions(), (90, 72));
    Ok(())
}

#[test]
fn binary_lists_every_rule() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_pixelbloom"))
        .arg("rules")
        .env("RUST_LOG", "off")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    for rule in Rule::ALL {
        assert!(stdout.contains(rule.name()), "missing {rule}");
    }
    Ok(())
}

#[test]
fn imported_snapshot_seeds_a_new_session() -> Result<()> {
    let dir = tempdir()?;
    let snapshot_path = dir.path().join("seed.png");

    let mut source = Engine::new(EngineConfig {
        rows: 20,
        cols: 20,
        rng_seed: Some(0x5EED),
        ..EngineConfig::default()
    })?;
    source.inject_shapes();
    source.inject_dots();
    export_png(source.canvas(), DEFAULT_BACKGROUND, 1, &snapshot_path)?;

    let scheduler = SchedulerConfig {
        dots_enabled: false,
        shapes_enabled: false,
        ..SchedulerConfig::default()
    };
    let mut target = Engine::new(EngineConfig {
        rows: 5,
        cols: 5,
        rng_seed: Some(1),
        rule: Rule::Jitter,
        params: PatternParams {
            jitter_chance: 1.0,
            ..PatternParams::default()
        },
        scheduler,
        ..EngineConfig::default()
    })?;
    import_png(&snapshot_path, &mut target)?;
    let imported = target.grid().clone();
    assert_eq!((imported.rows(), imported.cols()), (20, 20));
    // Every pixel is opaque, so the backdrop imports as one more color.
    assert_eq!(imported.occupied_count(), 400);

    let mut session = Session::new(target);
    let report = run_headless(
        &mut session,
        &HeadlessOptions {
            duration: Duration::from_secs(5),
            max_spread_steps: Some(6),
            ..HeadlessOptions::default()
        },
    );
    assert_eq!(report.initial.occupied, 400);
    assert!(report.frames.iter().all(|frame| frame.occupied == 400));

    session.engine_mut().clear();
    assert_eq!(session.engine().grid(), &imported);
    Ok(())
}
