//! Random choices made during a round
//!
//! Target selection and sway duration go through `RoundDice` so tests can
//! pin them down.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::Target;

/// Source of the per-round random choices
pub trait RoundDice {
    /// Pick one of the two targets, uniformly
    fn pick_target(&mut self) -> Target;
    /// Draw a sway duration uniformly in `[min, max)`
    fn sway_secs(&mut self, min: f64, max: f64) -> f64;
}

/// Seeded PCG dice for reproducible sessions
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: Pcg32,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RoundDice for SeededDice {
    fn pick_target(&mut self) -> Target {
        Target::ALL[self.rng.random_range(0..Target::ALL.len())]
    }

    fn sway_secs(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }
}

/// Dice that always roll the same values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDice {
    pub target: Target,
    pub sway_secs: f64,
}

impl FixedDice {
    pub fn new(target: Target, sway_secs: f64) -> Self {
        Self { target, sway_secs }
    }
}

impl RoundDice for FixedDice {
    fn pick_target(&mut self) -> Target {
        self.target
    }

    fn sway_secs(&mut self, _min: f64, _max: f64) -> f64 {
        self.sway_secs
    }
}
