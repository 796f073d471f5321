//! Persistent auxiliary state that outlives individual steps.

use crate::ColorIndex;
use crate::rules::Rule;

/// Maximum vein walker population kept after a step.
pub const MAX_WALKERS: usize = 200;
/// Radius added to every ripple per step.
pub const RIPPLE_GROWTH: f64 = 0.5;
/// Radius assigned to a freshly seeded ripple.
pub const RIPPLE_START_RADIUS: f64 = 1.0;

/// Mobile painter driven by the Vein rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walker {
    pub row: usize,
    pub col: usize,
    pub color: ColorIndex,
}

/// Expanding ring driven by the Ripple rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub row: usize,
    pub col: usize,
    pub color: ColorIndex,
    pub radius: f64,
    pub max_radius: f64,
}

impl Ripple {
    #[must_use]
    pub fn new(row: usize, col: usize, color: ColorIndex, max_radius: f64) -> Self {
        Self {
            row,
            col,
            color,
            radius: RIPPLE_START_RADIUS,
            max_radius,
        }
    }

    /// Whether the ripple has outgrown its maximum radius.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.radius > self.max_radius
    }
}

/// Half-step the last Strobe invocation ran; each call flips it before running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrobePhase {
    #[default]
    Expand,
    Contract,
}

impl StrobePhase {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            StrobePhase::Expand => StrobePhase::Contract,
            StrobePhase::Contract => StrobePhase::Expand,
        }
    }
}

/// Walkers, ripples, and the strobe phase, owned by one engine instance.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    walkers: Vec<Walker>,
    ripples: Vec<Ripple>,
    strobe: StrobePhase,
}

impl AgentState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    #[must_use]
    pub fn walkers_mut(&mut self) -> &mut Vec<Walker> {
        &mut self.walkers
    }

    #[must_use]
    pub fn ripples(&self) -> &[Ripple] {
        &self.ripples
    }

    #[must_use]
    pub fn ripples_mut(&mut self) -> &mut Vec<Ripple> {
        &mut self.ripples
    }

    #[must_use]
    pub const fn strobe_phase(&self) -> StrobePhase {
        self.strobe
    }

    #[must_use]
    pub fn strobe_phase_mut(&mut self) -> &mut StrobePhase {
        &mut self.strobe
    }

    /// Clear whatever state `rule` owns; rules without state are a no-op.
    pub fn reset_for(&mut self, rule: Rule) {
        match rule {
            Rule::Vein => self.walkers.clear(),
            Rule::Ripple => self.ripples.clear(),
            Rule::Strobe => self.strobe = StrobePhase::Expand,
            _ => {}
        }
    }

    /// Clear walkers, ripples, and rewind the strobe to its expand half.
    pub fn reset_all(&mut self) {
        self.walkers.clear();
        self.ripples.clear();
        self.strobe = StrobePhase::Expand;
    }

    /// True when no rule has left state behind.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.walkers.is_empty() && self.ripples.is_empty() && self.strobe == StrobePhase::Expand
    }
}
