//! The fourteen step rules and their dispatch.
//!
//! Every rule reads the current grid and returns a fresh one of the same shape; the input
//! is never mutated. Out-of-bounds neighbors are absent, never wrapped.

mod growth;
mod life;
mod motion;
mod neighborhood;
mod rearrange;
mod ripple;
mod spread;
mod vein;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::agents::AgentState;
use crate::config::PatternParams;
use crate::grid::Grid;

pub use rearrange::rotate_ring;

/// Errors produced when parsing rule or direction names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("unknown rule `{0}`")]
    UnknownRule(String),
    #[error("unknown direction `{0}`")]
    UnknownDirection(String),
}

/// Broad grouping of rules by how they evolve the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleFamily {
    /// Per-cell decisions from the Moore neighborhood.
    NeighborCounting,
    /// Persistent walkers or wavefronts.
    Agent,
    /// Moves existing colors around without creating new ones.
    Rearrangement,
}

/// Closed set of evolution algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    #[default]
    #[serde(rename = "random", alias = "random-walk")]
    RandomWalk,
    Conway,
    Pulse,
    Directional,
    Tendrils,
    Vein,
    Crystallize,
    Erosion,
    Flow,
    Jitter,
    Vortex,
    Strobe,
    Scramble,
    Ripple,
}

impl Rule {
    pub const ALL: [Rule; 14] = [
        Rule::RandomWalk,
        Rule::Conway,
        Rule::Pulse,
        Rule::Directional,
        Rule::Tendrils,
        Rule::Vein,
        Rule::Crystallize,
        Rule::Erosion,
        Rule::Flow,
        Rule::Jitter,
        Rule::Vortex,
        Rule::Strobe,
        Rule::Scramble,
        Rule::Ripple,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Rule::RandomWalk => "random",
            Rule::Conway => "conway",
            Rule::Pulse => "pulse",
            Rule::Directional => "directional",
            Rule::Tendrils => "tendrils",
            Rule::Vein => "vein",
            Rule::Crystallize => "crystallize",
            Rule::Erosion => "erosion",
            Rule::Flow => "flow",
            Rule::Jitter => "jitter",
            Rule::Vortex => "vortex",
            Rule::Strobe => "strobe",
            Rule::Scramble => "scramble",
            Rule::Ripple => "ripple",
        }
    }

    #[must_use]
    pub const fn family(self) -> RuleFamily {
        match self {
            Rule::Vein | Rule::Ripple => RuleFamily::Agent,
            Rule::Vortex | Rule::Scramble => RuleFamily::Rearrangement,
            _ => RuleFamily::NeighborCounting,
        }
    }

    /// Whether the rule keeps state in [`AgentState`] between steps.
    #[must_use]
    pub const fn is_stateful(self) -> bool {
        matches!(self, Rule::Vein | Rule::Ripple | Rule::Strobe)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if needle == "random-walk" {
            return Ok(Rule::RandomWalk);
        }
        Rule::ALL
            .into_iter()
            .find(|rule| rule.name() == needle)
            .ok_or_else(|| RuleParseError::UnknownRule(s.to_string()))
    }
}

/// Evolve `grid` by one application of `rule`.
///
/// `agents` is mutated in place by the stateful rules. Panics if the grid's storage does
/// not match its declared shape.
pub fn step(
    rule: Rule,
    grid: &Grid,
    params: &PatternParams,
    agents: &mut AgentState,
    rng: &mut dyn RngCore,
) -> Grid {
    grid.assert_coherent();
    match rule {
        Rule::RandomWalk => spread::random_walk(grid, params, rng),
        Rule::Conway => life::evolve(grid, &params.conway, params.soft_death_chance, rng),
        Rule::Tendrils => life::evolve(grid, &params.tendrils, params.soft_death_chance, rng),
        Rule::Pulse => spread::pulse(grid, params.pulse_direction, params.pulse_overtakes),
        Rule::Directional => spread::directional(grid, params, rng),
        Rule::Vein => vein::advance(grid, params, agents.walkers_mut(), rng),
        Rule::Crystallize => growth::crystallize(grid, params.crystallize_threshold, rng),
        Rule::Erosion => growth::erode(grid, params.erosion_rate, params.erosion_solidity, rng),
        Rule::Flow => motion::flow(grid, params.flow_direction, params.flow_chance, rng),
        Rule::Jitter => motion::jitter(grid, params.jitter_chance, rng),
        Rule::Vortex => rearrange::vortex(grid, params.vortex_count, rng),
        Rule::Strobe => growth::strobe(grid, params, agents.strobe_phase_mut()),
        Rule::Scramble => rearrange::scramble(grid, params.scramble_swaps, rng),
        Rule::Ripple => ripple::advance(grid, params.ripple_chance, agents.ripples_mut(), rng),
    }
}
