use serde::Serialize;

use crate::difficulty::{DifficultyLevel, DifficultyProfile};
use crate::registry::TargetRegistry;
use crate::target::{TargetId, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum_macros::Display)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum VerdictStatus {
    Win,
    Lose,
}

/// Final outcome, computed once when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub final_score: i64,
    pub threshold: i64,
    pub label: &'static str,
}

impl Verdict {
    /// Reaching the threshold exactly counts as a win
    pub fn compute(score: i64, profile: &DifficultyProfile) -> Self {
        let status = if score >= profile.win_score_threshold {
            VerdictStatus::Win
        } else {
            VerdictStatus::Lose
        };
        Self {
            status,
            final_score: score,
            threshold: profile.win_score_threshold,
            label: profile.label,
        }
    }

    pub fn is_win(&self) -> bool {
        self.status == VerdictStatus::Win
    }
}

/// Result of a hit registration. `applied == false` covers duplicate, late,
/// unknown and out-of-session hits; the deltas are then zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitResult {
    pub target_id: TargetId,
    pub applied: bool,
    pub kind: Option<TargetKind>,
    pub score_delta: i64,
    pub time_penalty_seconds: u32,
    pub new_score: i64,
    pub new_time_remaining: u32,
}

/// The single mutable aggregate of a play session
#[derive(Debug, Clone)]
pub struct Session {
    pub difficulty: DifficultyProfile,
    pub score: i64,
    pub time_remaining_seconds: u32,
    pub status: SessionStatus,
    pub registry: TargetRegistry,
    pub verdict: Option<Verdict>,
}

impl Session {
    pub fn new(difficulty: DifficultyProfile) -> Self {
        Self {
            difficulty,
            score: 0,
            time_remaining_seconds: difficulty.duration_seconds,
            status: SessionStatus::Idle,
            registry: TargetRegistry::new(),
            verdict: None,
        }
    }

    /// Fresh running state for `difficulty`; previous targets are discarded
    pub fn restart(&mut self, difficulty: DifficultyProfile) {
        *self = Self::new(difficulty);
        self.status = SessionStatus::Running;
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Subtract seconds from the clock, flooring at zero. Returns true when the
    /// clock is at zero afterwards.
    pub fn drain_time(&mut self, seconds: u32) -> bool {
        self.time_remaining_seconds = self.time_remaining_seconds.saturating_sub(seconds);
        self.time_remaining_seconds == 0
    }

    pub fn rejected_hit(&self, target_id: TargetId) -> HitResult {
        HitResult {
            target_id,
            applied: false,
            kind: None,
            score_delta: 0,
            time_penalty_seconds: 0,
            new_score: self.score,
            new_time_remaining: self.time_remaining_seconds,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DifficultyLevel::default().profile())
    }
}
