//! Hit scoring rules
//!
//! Good hits add the profile's reward. Bad hits subtract the profile's penalty
//! and, on an independent 60% draw, also cost two seconds of play time.
//! The score is unbounded in both directions; flooring the clock at zero is the
//! caller's job.

use crate::difficulty::DifficultyProfile;
use crate::rng::RandomSource;
use crate::target::TargetKind;

pub const TIME_PENALTY_PROBABILITY: f64 = 0.6;
pub const TIME_PENALTY_SECONDS: u32 = 2;

/// Effect of one resolved hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitOutcome {
    pub score_delta: i64,
    pub time_penalty_seconds: u32,
}

pub struct ScoringEngine {
    rng: Box<dyn RandomSource>,
}

impl ScoringEngine {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng }
    }

    pub fn apply_hit(&mut self, kind: TargetKind, profile: &DifficultyProfile) -> HitOutcome {
        match kind {
            TargetKind::Good => HitOutcome {
                score_delta: profile.good_score_delta,
                time_penalty_seconds: 0,
            },
            TargetKind::Bad => {
                let time_penalty_seconds = if self.rng.chance(TIME_PENALTY_PROBABILITY) {
                    TIME_PENALTY_SECONDS
                } else {
                    0
                };
                HitOutcome {
                    score_delta: profile.bad_score_delta,
                    time_penalty_seconds,
                }
            }
        }
    }
}
