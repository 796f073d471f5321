//! Parameter set, scheduler settings, and engine configuration.

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::rules::{Rule, RuleParseError};

/// Upper bound accepted for `vortex_count` after clamping.
pub const MAX_VORTEX_COUNT: usize = 10_000;
/// Upper bound accepted for `scramble_swaps` after clamping.
pub const MAX_SCRAMBLE_SWAPS: usize = 100_000;

/// Errors that can occur when constructing an engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// One of the eight compass directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::TopLeft,
        Direction::TopRight,
        Direction::BottomLeft,
        Direction::BottomRight,
    ];

    /// Row/column displacement of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::TopLeft => (-1, -1),
            Direction::TopRight => (-1, 1),
            Direction::BottomLeft => (1, -1),
            Direction::BottomRight => (1, 1),
        }
    }

    /// Whether a scan leading in this direction walks rows bottom to top.
    #[must_use]
    pub const fn reverses_rows(self) -> bool {
        self.delta().0 < 0
    }

    /// Whether a scan leading in this direction walks columns right to left.
    #[must_use]
    pub const fn reverses_cols(self) -> bool {
        self.delta().1 < 0
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::TopLeft => "top-left",
            Direction::TopRight => "top-right",
            Direction::BottomLeft => "bottom-left",
            Direction::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Direction::ALL
            .into_iter()
            .find(|direction| direction.name() == needle)
            .ok_or_else(|| RuleParseError::UnknownDirection(s.to_string()))
    }
}

/// Four-way direction used by Flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinal {
    Up,
    Down,
    Left,
    Right,
}

impl From<Cardinal> for Direction {
    fn from(value: Cardinal) -> Self {
        match value {
            Cardinal::Up => Direction::Up,
            Cardinal::Down => Direction::Down,
            Cardinal::Left => Direction::Left,
            Cardinal::Right => Direction::Right,
        }
    }
}

impl FromStr for Cardinal {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Direction>()? {
            Direction::Up => Ok(Cardinal::Up),
            Direction::Down => Ok(Cardinal::Down),
            Direction::Left => Ok(Cardinal::Left),
            Direction::Right => Ok(Cardinal::Right),
            _ => Err(RuleParseError::UnknownDirection(s.to_string())),
        }
    }
}

/// Neighborhood used by the random walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalkMode {
    /// All eight Moore neighbors.
    #[default]
    Any,
    /// Only the four edge-adjacent neighbors.
    Cardinal,
}

/// Birth and survival neighbor counts for a life-like rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeRules {
    pub born: Vec<u8>,
    pub survive: Vec<u8>,
}

impl LifeRules {
    /// Classic B3/S23.
    #[must_use]
    pub fn conway() -> Self {
        Self {
            born: vec![3],
            survive: vec![2, 3],
        }
    }

    /// Sparse B1/S12 growth.
    #[must_use]
    pub fn tendrils() -> Self {
        Self {
            born: vec![1],
            survive: vec![1, 2],
        }
    }

    #[must_use]
    pub fn is_born(&self, live: usize) -> bool {
        self.born.iter().any(|&count| usize::from(count) == live)
    }

    #[must_use]
    pub fn survives(&self, live: usize) -> bool {
        self.survive.iter().any(|&count| usize::from(count) == live)
    }

    fn clamped(&self) -> Self {
        let normalize = |counts: &[u8]| {
            let mut counts: Vec<u8> = counts.iter().copied().filter(|&c| c <= 8).collect();
            counts.sort_unstable();
            counts.dedup();
            counts
        };
        Self {
            born: normalize(&self.born),
            survive: normalize(&self.survive),
        }
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Every tunable consulted by the rule library. Read-only during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    /// Per-cell chance that Directional and Random Walk spread at all.
    pub spread_probability: f64,
    /// Neighbors painted per spreading cell in Random Walk (1..=8).
    pub spread_count: usize,
    /// Neighborhood shape used by Random Walk.
    pub walk_mode: WalkMode,
    /// Direction a Pulse wave leads in.
    pub pulse_direction: Direction,
    /// Whether Pulse paints over occupied neighbors.
    pub pulse_overtakes: bool,
    /// Preferred Directional push; `None` always picks a random neighbor.
    pub bias: Option<Direction>,
    /// Chance a Directional spread follows the bias.
    pub bias_strength: f64,
    /// Birth/survival table for Conway.
    pub conway: LifeRules,
    /// Birth/survival table for Tendrils.
    pub tendrils: LifeRules,
    /// Chance that a life-like cell failing its survival test actually dies.
    pub soft_death_chance: f64,
    /// Chance a vein walker steers toward the nearest occupied cell.
    pub vein_seek_strength: f64,
    /// Chance a vein walker spawns a duplicate after moving.
    pub vein_branch_chance: f64,
    /// Like-colored neighbors needed for Crystallize growth.
    pub crystallize_threshold: usize,
    /// Chance an exposed cell erodes.
    pub erosion_rate: f64,
    /// Open neighbors needed before a cell can erode.
    pub erosion_solidity: usize,
    /// Direction cells drift under Flow.
    pub flow_direction: Cardinal,
    /// Per-cell chance of moving under Flow.
    pub flow_chance: f64,
    /// Per-cell chance of moving under Jitter.
    pub jitter_chance: f64,
    /// Anchors rotated per Vortex step.
    pub vortex_count: usize,
    /// Occupied neighbors needed for a Strobe expand.
    pub strobe_expand_threshold: usize,
    /// Open neighbors needed for a Strobe contract.
    pub strobe_contract_threshold: usize,
    /// Upper bound on pairwise swaps per Scramble step.
    pub scramble_swaps: usize,
    /// Chance a sampled occupied cell seeds a ripple.
    pub ripple_chance: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            spread_probability: 0.3,
            spread_count: 1,
            walk_mode: WalkMode::Any,
            pulse_direction: Direction::BottomRight,
            pulse_overtakes: true,
            bias: Some(Direction::Down),
            bias_strength: 0.8,
            conway: LifeRules::conway(),
            tendrils: LifeRules::tendrils(),
            soft_death_chance: 0.1,
            vein_seek_strength: 0.5,
            vein_branch_chance: 0.15,
            crystallize_threshold: 2,
            erosion_rate: 0.3,
            erosion_solidity: 4,
            flow_direction: Cardinal::Down,
            flow_chance: 0.7,
            jitter_chance: 0.4,
            vortex_count: 8,
            strobe_expand_threshold: 2,
            strobe_contract_threshold: 4,
            scramble_swaps: 15,
            ripple_chance: 0.15,
        }
    }
}

impl PatternParams {
    /// Copy with every field forced into its documented range. Rules never validate.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            spread_probability: clamp01(self.spread_probability),
            spread_count: self.spread_count.clamp(1, 8),
            bias_strength: clamp01(self.bias_strength),
            conway: self.conway.clamped(),
            tendrils: self.tendrils.clamped(),
            soft_death_chance: clamp01(self.soft_death_chance),
            vein_seek_strength: clamp01(self.vein_seek_strength),
            vein_branch_chance: clamp01(self.vein_branch_chance),
            crystallize_threshold: self.crystallize_threshold.min(8),
            erosion_rate: clamp01(self.erosion_rate),
            erosion_solidity: self.erosion_solidity.min(8),
            flow_chance: clamp01(self.flow_chance),
            jitter_chance: clamp01(self.jitter_chance),
            vortex_count: self.vortex_count.min(MAX_VORTEX_COUNT),
            strobe_expand_threshold: self.strobe_expand_threshold.min(8),
            strobe_contract_threshold: self.strobe_contract_threshold.min(8),
            scramble_swaps: self.scramble_swaps.min(MAX_SCRAMBLE_SWAPS),
            ripple_chance: clamp01(self.ripple_chance),
            ..self.clone()
        }
    }

    /// Whether `clamped` would leave these parameters unchanged.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        self.clamped() == *self
    }
}

/// Cadence and enable flags for the three producer loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Spread steps per second for every rule except Pulse.
    pub spread_speed: f64,
    /// Spread steps per second while Pulse is active.
    pub pulse_speed: f64,
    /// Dot injections per second.
    pub dot_speed: f64,
    /// Shape injections per second.
    pub shape_speed: f64,
    pub spread_enabled: bool,
    pub dots_enabled: bool,
    pub shapes_enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            spread_speed: 3.0,
            pulse_speed: 10.0,
            dot_speed: 1.0,
            shape_speed: 1.0,
            spread_enabled: true,
            dots_enabled: true,
            shapes_enabled: true,
        }
    }
}

/// Static configuration for an engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid height in cells.
    pub rows: usize,
    /// Grid width in cells.
    pub cols: usize,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Maximum number of recent step summaries retained in-memory.
    pub history_capacity: usize,
    /// Rule active when the engine starts.
    pub rule: Rule,
    pub params: PatternParams,
    pub scheduler: SchedulerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: 375,
            cols: 375,
            rng_seed: None,
            history_capacity: 256,
            rule: Rule::default(),
            params: PatternParams::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations no engine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::InvalidConfig(
                "grid dimensions must be non-zero",
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "history_capacity must be positive",
            ));
        }
        let speeds = [
            self.scheduler.spread_speed,
            self.scheduler.pulse_speed,
            self.scheduler.dot_speed,
            self.scheduler.shape_speed,
        ];
        if speeds.iter().any(|speed| !speed.is_finite() || *speed < 0.0) {
            return Err(ConfigError::InvalidConfig(
                "loop speeds must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}
