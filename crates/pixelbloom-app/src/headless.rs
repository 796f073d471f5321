use anyhow::{Context, Result};
use pixelbloom_core::{Engine, Rule, Session, StepSummary};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    path::Path,
    time::Duration,
};
use tracing::info;

/// Frame rate of the simulated host clock.
const HOST_FRAMES_PER_SECOND: f64 = 60.0;

/// Limits for a headless run on a simulated clock.
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    /// Simulated wall time to run for.
    pub duration: Duration,
    /// Host frame spacing; each frame is one `Session::tick`.
    pub frame_interval: Duration,
    /// Stop early once this many spread steps have run.
    pub max_spread_steps: Option<u64>,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            frame_interval: Duration::from_secs_f64(1.0 / HOST_FRAMES_PER_SECOND),
            max_spread_steps: None,
        }
    }
}

/// Drive every enabled loop until the duration or step budget is exhausted.
///
/// Loops are started at time zero and stopped before returning.
pub fn run_headless(session: &mut Session, options: &HeadlessOptions) -> HeadlessReport {
    let mut report = HeadlessReport::new(session.engine());
    session.start_all_enabled(Duration::ZERO);

    let frame_interval = options.frame_interval.max(Duration::from_micros(1));
    let mut now = Duration::ZERO;
    let mut host_frames = 0u64;
    while now < options.duration {
        if options
            .max_spread_steps
            .is_some_and(|limit| report.summary.spread_steps >= limit)
        {
            break;
        }
        now += frame_interval;
        host_frames += 1;
        let events = session.tick(now);
        if let Some(step) = &events.step {
            report.record(step);
        }
        report.summary.dot_injections += u64::from(events.dots_injected);
        report.summary.shape_injections += u64::from(events.shapes_injected);
        if events.step.is_some() || events.dots_injected || events.shapes_injected {
            report.observe_occupied(session.engine().grid().occupied_count());
        }
    }
    session.stop_all();

    report.finalize(session.engine(), now, host_frames);
    info!(
        spread_steps = report.summary.spread_steps,
        dots = report.summary.dot_injections,
        shapes = report.summary.shape_injections,
        occupied = report.summary.final_occupied,
        simulated_secs = report.summary.simulated_seconds,
        "headless run complete"
    );
    report
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessReport {
    pub initial: FrameStats,
    pub frames: Vec<FrameStats>,
    pub summary: ReportSummary,
}

impl HeadlessReport {
    fn new(engine: &Engine) -> Self {
        let occupied = engine.grid().occupied_count();
        Self {
            initial: FrameStats {
                tick: engine.tick().0,
                rule: engine.rule(),
                occupied,
                changed: 0,
            },
            frames: Vec::new(),
            summary: ReportSummary {
                peak_occupied: occupied,
                ..ReportSummary::default()
            },
        }
    }

    /// Track occupancy after a tick, including cells painted by injections.
    fn observe_occupied(&mut self, occupied: usize) {
        self.summary.peak_occupied = self.summary.peak_occupied.max(occupied);
    }

    fn record(&mut self, step: &StepSummary) {
        self.frames.push(FrameStats::from(step));
        self.summary.spread_steps += 1;
    }

    fn finalize(&mut self, engine: &Engine, elapsed: Duration, host_frames: u64) {
        let summary = &mut self.summary;
        summary.host_frames = host_frames;
        summary.simulated_seconds = elapsed.as_secs_f64();
        summary.final_tick = engine.tick().0;
        summary.final_rule = engine.rule();
        summary.final_occupied = engine.grid().occupied_count();
        summary.peak_occupied = summary.peak_occupied.max(summary.final_occupied);
        summary.total_changed = self.frames.iter().map(|frame| frame.changed as u64).sum();
        summary.walkers = engine.agents().walkers().len();
        summary.ripples = engine.agents().ripples().len();
    }

    /// Write the report as pretty JSON, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).context("failed to serialize headless report")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub tick: u64,
    pub rule: Rule,
    pub occupied: usize,
    pub changed: usize,
}

impl From<&StepSummary> for FrameStats {
    fn from(step: &StepSummary) -> Self {
        Self {
            tick: step.tick.0,
            rule: step.rule,
            occupied: step.occupied,
            changed: step.changed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub host_frames: u64,
    pub simulated_seconds: f64,
    pub spread_steps: u64,
    pub dot_injections: u64,
    pub shape_injections: u64,
    pub final_tick: u64,
    pub final_rule: Rule,
    pub final_occupied: usize,
    pub peak_occupied: usize,
    pub total_changed: u64,
    pub walkers: usize,
    pub ripples: usize,
}
