//! Random sources for spawning and penalty draws.
//!
//! The engine never touches a global RNG. Every component that draws gets its own
//! `RandomSource`, so a seeded or scripted source makes a session fully repeatable.

use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

pub trait RandomSource: Send {
    /// True with probability `p` (clamped to [0, 1])
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform integer in the inclusive range `[lo, hi]`; returns `lo` when `hi < lo`
    fn int_in(&mut self, lo: u32, hi: u32) -> u32;

    /// Uniform value in `[0, 1)`
    fn fraction(&mut self) -> f64;
}

/// `StdRng`-backed source, reproducible when built from a seed
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    fn int_in(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    fn fraction(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays pre-recorded draws. Each queue falls back to a fixed default once
/// drained: `chance` -> false, `int_in` -> `lo`, `fraction` -> 0.0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    chances: VecDeque<bool>,
    ints: VecDeque<u32>,
    fractions: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chances<I: IntoIterator<Item = bool>>(mut self, draws: I) -> Self {
        self.chances.extend(draws);
        self
    }

    pub fn with_ints<I: IntoIterator<Item = u32>>(mut self, draws: I) -> Self {
        self.ints.extend(draws);
        self
    }

    pub fn with_fractions<I: IntoIterator<Item = f64>>(mut self, draws: I) -> Self {
        self.fractions.extend(draws);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn chance(&mut self, _p: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }

    fn int_in(&mut self, lo: u32, hi: u32) -> u32 {
        self.ints
            .pop_front()
            .map(|v| v.clamp(lo, hi.max(lo)))
            .unwrap_or(lo)
    }

    fn fraction(&mut self) -> f64 {
        self.fractions
            .pop_front()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .unwrap_or(0.0)
    }
}
