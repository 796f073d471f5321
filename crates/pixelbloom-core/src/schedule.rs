//! Step scheduling: three independently toggled loops driven by a host clock.
//!
//! The host calls [`Session::tick`] from its frame or timer callback with a monotonic
//! timestamp. Each loop fires at most once per tick, and pending control commands are
//! applied before any loop fires, so no step ever observes an edit mid-step.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::{ControlCommand, Engine, StepSummary, apply_control_command};
use crate::rules::Rule;

/// Lowest speed the spread loop honors, in steps per second.
pub const SPREAD_SPEED_FLOOR: f64 = 0.25;
/// Lowest speed the dot and shape loops honor, in injections per second.
pub const INJECT_SPEED_FLOOR: f64 = 0.1;
/// Host polling rate assumed when thinning slow spread loops.
const POLLS_PER_SECOND: f64 = 60.0;

/// Which producer a loop drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopKind {
    Spread,
    Dots,
    Shapes,
}

impl LoopKind {
    #[must_use]
    pub const fn speed_floor(self) -> f64 {
        match self {
            LoopKind::Spread => SPREAD_SPEED_FLOOR,
            LoopKind::Dots | LoopKind::Shapes => INJECT_SPEED_FLOOR,
        }
    }
}

/// Interval gate for one producer loop.
#[derive(Debug, Clone)]
pub struct StepLoop {
    kind: LoopKind,
    running: bool,
    last_fire: Duration,
    polls: u64,
}

impl StepLoop {
    #[must_use]
    pub const fn new(kind: LoopKind) -> Self {
        Self {
            kind,
            running: false,
            last_fire: Duration::ZERO,
            polls: 0,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> LoopKind {
        self.kind
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Minimum time between firings at `speed`.
    #[must_use]
    pub fn interval(&self, speed: f64) -> Duration {
        Duration::from_secs_f64(1.0 / speed.max(self.kind.speed_floor()))
    }

    /// Begin running; the first firing comes one interval after `now`.
    pub fn start(&mut self, now: Duration) {
        self.running = true;
        self.last_fire = now;
        self.polls = 0;
    }

    /// Stop running. Returns whether the loop was running; stopping twice is a no-op.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Whether the producer should fire at `now`. Records the firing time when it does.
    pub fn poll(&mut self, now: Duration, speed: f64) -> bool {
        if !self.running {
            return false;
        }
        if self.kind == LoopKind::Spread && speed < 1.0 {
            self.polls += 1;
            let period = (POLLS_PER_SECOND / speed.max(SPREAD_SPEED_FLOOR)).ceil() as u64;
            if !self.polls.is_multiple_of(period.max(1)) {
                return false;
            }
        }
        if now.saturating_sub(self.last_fire) >= self.interval(speed) {
            self.last_fire = now;
            true
        } else {
            false
        }
    }
}

/// What fired during one [`Session::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    pub step: Option<StepSummary>,
    pub dots_injected: bool,
    pub shapes_injected: bool,
    pub commands_applied: usize,
}

/// An engine plus its three producer loops and the pending command queue.
#[derive(Debug)]
pub struct Session {
    engine: Engine,
    spread: StepLoop,
    dots: StepLoop,
    shapes: StepLoop,
    pending: VecDeque<ControlCommand>,
}

impl Session {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            spread: StepLoop::new(LoopKind::Spread),
            dots: StepLoop::new(LoopKind::Dots),
            shapes: StepLoop::new(LoopKind::Shapes),
            pending: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    #[must_use]
    pub fn into_engine(self) -> Engine {
        self.engine
    }

    #[must_use]
    pub fn step_loop(&self, kind: LoopKind) -> &StepLoop {
        match kind {
            LoopKind::Spread => &self.spread,
            LoopKind::Dots => &self.dots,
            LoopKind::Shapes => &self.shapes,
        }
    }

    fn step_loop_mut(&mut self, kind: LoopKind) -> &mut StepLoop {
        match kind {
            LoopKind::Spread => &mut self.spread,
            LoopKind::Dots => &mut self.dots,
            LoopKind::Shapes => &mut self.shapes,
        }
    }

    #[must_use]
    pub fn is_running(&self, kind: LoopKind) -> bool {
        self.step_loop(kind).is_running()
    }

    /// Queue an edit to be applied before the next step.
    pub fn submit(&mut self, command: ControlCommand) {
        self.pending.push_back(command);
    }

    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Start a loop. A fresh spread run starts from clean agent state.
    pub fn start(&mut self, kind: LoopKind, now: Duration) {
        if kind == LoopKind::Spread {
            self.engine.reset_agents();
        }
        self.step_loop_mut(kind).start(now);
        info!(?kind, rule = %self.engine.rule(), "loop started");
    }

    /// Stop a loop immediately. Idempotent.
    pub fn stop(&mut self, kind: LoopKind) {
        if self.step_loop_mut(kind).stop() {
            info!(?kind, "loop stopped");
        }
    }

    /// Start the loop if stopped, stop it if running.
    pub fn toggle(&mut self, kind: LoopKind, now: Duration) {
        if self.is_running(kind) {
            self.stop(kind);
        } else {
            self.start(kind, now);
        }
    }

    /// Start every loop whose enable flag is set and that is not already running.
    pub fn start_all_enabled(&mut self, now: Duration) {
        let scheduler = self.engine.config().scheduler;
        let wanted = [
            (LoopKind::Spread, scheduler.spread_enabled),
            (LoopKind::Dots, scheduler.dots_enabled),
            (LoopKind::Shapes, scheduler.shapes_enabled),
        ];
        for (kind, enabled) in wanted {
            if enabled && !self.is_running(kind) {
                self.start(kind, now);
            }
        }
    }

    pub fn stop_all(&mut self) {
        for kind in [LoopKind::Spread, LoopKind::Dots, LoopKind::Shapes] {
            self.stop(kind);
        }
    }

    /// Apply queued edits in submission order.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(command) = self.pending.pop_front() {
            debug!(?command, "applying control command");
            if let Err(err) = apply_control_command(&mut self.engine, command) {
                warn!(%err, "control command rejected");
            }
            applied += 1;
        }
        applied
    }

    /// Single manual spread step, outside the loops.
    pub fn step_once(&mut self) -> StepSummary {
        self.apply_pending();
        self.engine.step()
    }

    /// Speed the spread loop runs at for the active rule.
    #[must_use]
    pub fn spread_speed(&self) -> f64 {
        let scheduler = &self.engine.config().scheduler;
        if self.engine.rule() == Rule::Pulse {
            scheduler.pulse_speed
        } else {
            scheduler.spread_speed
        }
    }

    /// Drive all loops at host time `now`.
    pub fn tick(&mut self, now: Duration) -> TickEvents {
        let commands_applied = self.apply_pending();
        let scheduler = self.engine.config().scheduler;
        let spread_speed = self.spread_speed();

        let step = self
            .spread
            .poll(now, spread_speed)
            .then(|| self.engine.step());
        let dots_injected = self.dots.poll(now, scheduler.dot_speed);
        if dots_injected {
            self.engine.inject_dots();
        }
        let shapes_injected = self.shapes.poll(now, scheduler.shape_speed);
        if shapes_injected {
            self.engine.inject_shapes();
        }
        TickEvents {
            step,
            dots_injected,
            shapes_injected,
            commands_applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Walker;
    use crate::config::{EngineConfig, PatternParams};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn session(rule: Rule) -> Session {
        let config = EngineConfig {
            rows: 16,
            cols: 16,
            rng_seed: Some(21),
            rule,
            ..EngineConfig::default()
        };
        Session::new(Engine::new(config).expect("engine"))
    }

    #[test]
    fn interval_honors_speed_floors() {
        let spread = StepLoop::new(LoopKind::Spread);
        assert_eq!(spread.interval(4.0), ms(250));
        assert_eq!(spread.interval(0.0), ms(4000));
        let dots = StepLoop::new(LoopKind::Dots);
        assert_eq!(dots.interval(0.01), ms(10_000));
        assert_eq!(dots.interval(f64::NAN), ms(10_000));
    }

    #[test]
    fn loop_fires_once_per_interval() {
        let mut step_loop = StepLoop::new(LoopKind::Dots);
        assert!(!step_loop.poll(ms(5000), 1.0));
        step_loop.start(ms(0));
        assert!(!step_loop.poll(ms(999), 1.0));
        assert!(step_loop.poll(ms(1000), 1.0));
        assert!(!step_loop.poll(ms(1500), 1.0));
        assert!(step_loop.poll(ms(2100), 1.0));
    }

    #[test]
    fn slow_spread_thins_polls() {
        let mut step_loop = StepLoop::new(LoopKind::Spread);
        step_loop.start(ms(0));
        // At 0.5 steps/s only every 120th poll is considered.
        let fired: Vec<u64> = (1..=480)
            .filter(|frame| step_loop.poll(ms(frame * 1000 / 60), 0.5))
            .collect();
        assert_eq!(fired, vec![120, 240, 360, 480]);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut session = session(Rule::Conway);
        session.start(LoopKind::Dots, ms(0));
        session.stop(LoopKind::Dots);
        session.stop(LoopKind::Dots);
        assert!(!session.is_running(LoopKind::Dots));
        assert_eq!(session.tick(ms(10_000)), TickEvents::default());
    }

    #[test]
    fn starting_spread_resets_agents() {
        let mut session = session(Rule::Vein);
        session.engine_mut().agents_mut().walkers_mut().push(Walker {
            row: 0,
            col: 0,
            color: 1,
        });
        session.start(LoopKind::Dots, ms(0));
        assert_eq!(session.engine().agents().walkers().len(), 1);
        session.start(LoopKind::Spread, ms(0));
        assert!(session.engine().agents().is_pristine());
    }

    #[test]
    fn strobe_run_opens_with_contract_after_start() {
        let mut session = session(Rule::Strobe);
        session.engine_mut().canvas_mut().paint(5, 5, 1);
        session.start(LoopKind::Spread, ms(0));
        session.step_once();
        assert!(session.engine().grid().is_blank());

        // Mid-run the next half-step expands, which leaves a lone cell alone.
        session.engine_mut().canvas_mut().paint(5, 5, 1);
        session.step_once();
        assert_eq!(session.engine().grid().occupied_count(), 1);

        session.stop(LoopKind::Spread);
        session.start(LoopKind::Spread, ms(100));
        session.step_once();
        assert!(session.engine().grid().is_blank());
    }

    #[test]
    fn pulse_uses_its_own_speed() {
        let mut session = session(Rule::Pulse);
        assert_eq!(session.spread_speed(), 10.0);
        session.submit(ControlCommand::SetRule(Rule::Erosion));
        session.apply_pending();
        assert_eq!(session.spread_speed(), 3.0);
    }

    #[test]
    fn tick_applies_commands_before_stepping() {
        let mut session = session(Rule::Tendrils);
        session.start(LoopKind::Spread, ms(0));
        session.submit(ControlCommand::UpdateParams(Box::new(PatternParams {
            soft_death_chance: 0.0,
            ..PatternParams::default()
        })));
        session.submit(ControlCommand::Paint {
            row: 8,
            col: 8,
            color: 2,
        });
        let events = session.tick(ms(400));
        assert_eq!(events.commands_applied, 2);
        let step = events.step.expect("spread step");
        // B1 grows the full Moore ring around the painted seed.
        assert_eq!(step.occupied, 9);
        assert_eq!(session.pending_commands(), 0);
    }

    #[test]
    fn start_all_honors_enable_flags() {
        let config = EngineConfig {
            rows: 8,
            cols: 8,
            rng_seed: Some(2),
            scheduler: crate::config::SchedulerConfig {
                shapes_enabled: false,
                ..Default::default()
            },
            ..EngineConfig::default()
        };
        let mut session = Session::new(Engine::new(config).expect("engine"));
        session.start_all_enabled(ms(0));
        assert!(session.is_running(LoopKind::Spread));
        assert!(session.is_running(LoopKind::Dots));
        assert!(!session.is_running(LoopKind::Shapes));
        session.stop_all();
        assert!(!session.is_running(LoopKind::Spread));
        assert!(!session.is_running(LoopKind::Dots));
    }

    #[test]
    fn step_once_works_while_stopped() {
        let mut session = session(Rule::RandomWalk);
        session.submit(ControlCommand::Paint {
            row: 0,
            col: 0,
            color: 1,
        });
        let summary = session.step_once();
        assert_eq!(summary.tick.0, 1);
        assert!(summary.occupied >= 1);
    }
}
