//! Core types and evolution rules shared across the PixelBloom workspace.

use serde::{Deserialize, Serialize};

pub mod agents;
pub mod config;
pub mod engine;
pub mod grid;
pub mod inject;
pub mod rules;
pub mod schedule;

pub use agents::{AgentState, MAX_WALKERS, Ripple, StrobePhase, Walker};
pub use config::{
    Cardinal, ConfigError, Direction, EngineConfig, LifeRules, PatternParams, SchedulerConfig,
    WalkMode,
};
pub use engine::{ControlCommand, Engine, StepSummary, apply_control_command};
pub use grid::{Canvas, EMPTY, Grid, GridError, Palette, Rgb};
pub use inject::{inject_dots, inject_shapes};
pub use rules::{Rule, RuleFamily, RuleParseError, rotate_ring, step};
pub use schedule::{LoopKind, Session, StepLoop, TickEvents};

/// Palette index stored in each grid cell; `0` is empty.
pub type ColorIndex = u32;

/// Number of engine steps processed since creation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}
