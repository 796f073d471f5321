//! Engine instance: canvas, agent state, active rule, and RNG.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::agents::AgentState;
use crate::config::{ConfigError, EngineConfig, PatternParams};
use crate::grid::{Canvas, Grid, GridError, Rgb};
use crate::inject::{inject_dots, inject_shapes};
use crate::rules::{self, Rule};
use crate::{ColorIndex, Tick};

/// Per-step record retained in the engine history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub tick: Tick,
    pub rule: Rule,
    /// Occupied cells after the step.
    pub occupied: usize,
    /// Cells whose value differs from the pre-step grid.
    pub changed: usize,
}

/// Host-issued edits, applied between steps.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetRule(Rule),
    UpdateParams(Box<PatternParams>),
    Paint {
        row: usize,
        col: usize,
        color: ColorIndex,
    },
    Resize {
        rows: usize,
        cols: usize,
    },
    Clear,
    ImportRgba {
        width: usize,
        height: usize,
        rgba: Vec<u8>,
    },
    SetPreview(Option<Rgb>),
    CommitPreview(ColorIndex),
    ResetAgents,
}

/// Owns everything a step touches. Steps are synchronous and atomic: the canvas grid is
/// replaced wholesale after the rule returns.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    tick: Tick,
    rng: SmallRng,
    canvas: Canvas,
    agents: AgentState,
    history: VecDeque<StepSummary>,
}

impl Engine {
    /// Instantiate an engine with a blank canvas of the configured size.
    pub fn new(mut config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clamped = config.params.clamped();
        if clamped != config.params {
            warn!("pattern parameters were outside their ranges and have been clamped");
            config.params = clamped;
        }
        let rng = config.seeded_rng();
        let canvas = Canvas::new(config.rows, config.cols);
        let history_capacity = config.history_capacity;
        info!(
            rows = config.rows,
            cols = config.cols,
            rule = %config.rule,
            "engine initialized"
        );
        Ok(Self {
            config,
            tick: Tick::zero(),
            rng,
            canvas,
            agents: AgentState::new(),
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Apply the active rule once and record a summary.
    pub fn step(&mut self) -> StepSummary {
        let rule = self.config.rule;
        let grid = self.canvas.grid();
        let next = rules::step(
            rule,
            grid,
            &self.config.params,
            &mut self.agents,
            &mut self.rng,
        );
        let changed = grid.diff_count(&next);
        let occupied = next.occupied_count();
        self.canvas.replace_grid(next);
        self.tick = self.tick.next();

        let summary = StepSummary {
            tick: self.tick,
            rule,
            occupied,
            changed,
        };
        debug!(
            tick = self.tick.0,
            %rule,
            occupied,
            changed,
            walkers = self.agents.walkers().len(),
            ripples = self.agents.ripples().len(),
            "engine step"
        );
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary.clone());
        summary
    }

    /// Scatter random dots onto the canvas.
    pub fn inject_dots(&mut self) {
        let next = inject_dots(self.canvas.grid(), self.canvas.palette(), &mut self.rng);
        self.canvas.replace_grid(next);
    }

    /// Draw random rectangles or lines onto the canvas.
    pub fn inject_shapes(&mut self) {
        let next = inject_shapes(self.canvas.grid(), self.canvas.palette(), &mut self.rng);
        self.canvas.replace_grid(next);
    }

    /// Switch rules, clearing state left behind by the previous one.
    pub fn set_rule(&mut self, rule: Rule) {
        let previous = self.config.rule;
        if previous == rule {
            return;
        }
        self.agents.reset_for(previous);
        self.config.rule = rule;
        info!(from = %previous, to = %rule, "rule changed");
    }

    /// Replace the parameter set, clamping anything out of range.
    pub fn set_params(&mut self, params: PatternParams) {
        let clamped = params.clamped();
        if clamped != params {
            warn!("pattern parameters were outside their ranges and have been clamped");
        }
        self.config.params = clamped;
    }

    /// Clear the state owned by `rule`.
    pub fn reset_agent_state(&mut self, rule: Rule) {
        self.agents.reset_for(rule);
    }

    /// Clear all walkers and ripples and rewind the strobe.
    pub fn reset_agents(&mut self) {
        self.agents.reset_all();
    }

    /// Reshape the canvas; agents are dropped since their coordinates no longer apply.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.canvas.resize(rows, cols);
        self.agents.reset_all();
        self.config.rows = rows;
        self.config.cols = cols;
        info!(rows, cols, "canvas resized");
    }

    /// Restore the imported original or blank the canvas.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.agents.reset_all();
    }

    /// Replace the canvas with a quantized RGBA image.
    pub fn import_rgba(&mut self, width: usize, height: usize, rgba: &[u8]) -> Result<(), GridError> {
        self.canvas.import_rgba(width, height, rgba)?;
        self.agents.reset_all();
        self.config.rows = height;
        self.config.cols = width;
        info!(
            width,
            height,
            palette = self.canvas.palette().len(),
            occupied = self.canvas.grid().occupied_count(),
            "image imported"
        );
        Ok(())
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn rule(&self) -> Rule {
        self.config.rule
    }

    #[must_use]
    pub fn params(&self) -> &PatternParams {
        &self.config.params
    }

    /// Current step counter.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[must_use]
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.canvas.grid()
    }

    #[must_use]
    pub fn agents(&self) -> &AgentState {
        &self.agents
    }

    #[must_use]
    pub fn agents_mut(&mut self) -> &mut AgentState {
        &mut self.agents
    }

    /// Borrow the engine RNG mutably for deterministic sampling.
    #[must_use]
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Iterate over retained step summaries.
    pub fn history(&self) -> impl Iterator<Item = &StepSummary> {
        self.history.iter()
    }
}

/// Apply one host edit to the engine.
pub fn apply_control_command(engine: &mut Engine, command: ControlCommand) -> Result<(), GridError> {
    match command {
        ControlCommand::SetRule(rule) => engine.set_rule(rule),
        ControlCommand::UpdateParams(params) => engine.set_params(*params),
        ControlCommand::Paint { row, col, color } => {
            engine.canvas_mut().paint(row, col, color);
        }
        ControlCommand::Resize { rows, cols } => engine.resize(rows, cols),
        ControlCommand::Clear => engine.clear(),
        ControlCommand::ImportRgba {
            width,
            height,
            rgba,
        } => engine.import_rgba(width, height, &rgba)?,
        ControlCommand::SetPreview(color) => engine.canvas_mut().set_preview(color),
        ControlCommand::CommitPreview(index) => {
            engine.canvas_mut().commit_preview(index);
        }
        ControlCommand::ResetAgents => engine.reset_agents(),
    }
    Ok(())
}
