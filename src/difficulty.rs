use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Named difficulty levels a session can be started with
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Easy,
        DifficultyLevel::Normal,
        DifficultyLevel::Hard,
    ];

    pub fn profile(self) -> DifficultyProfile {
        match self {
            DifficultyLevel::Easy => EASY,
            DifficultyLevel::Normal => NORMAL,
            DifficultyLevel::Hard => HARD,
        }
    }

    /// Next level in menu order, wrapping around
    pub fn next(self) -> Self {
        match self {
            DifficultyLevel::Easy => DifficultyLevel::Normal,
            DifficultyLevel::Normal => DifficultyLevel::Hard,
            DifficultyLevel::Hard => DifficultyLevel::Easy,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            DifficultyLevel::Easy => DifficultyLevel::Hard,
            DifficultyLevel::Normal => DifficultyLevel::Easy,
            DifficultyLevel::Hard => DifficultyLevel::Normal,
        }
    }
}

/// Immutable pacing and scoring parameters for one session.
///
/// `object_lifetime_ms` is kept within ~20% of `spawn_interval_ms` for every
/// built-in profile so only one or two targets are live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifficultyProfile {
    pub level: DifficultyLevel,
    pub duration_seconds: u32,
    pub spawn_interval_ms: u64,
    pub object_lifetime_ms: u64,
    pub good_score_delta: i64,
    pub bad_score_delta: i64,
    pub win_score_threshold: i64,
    pub label: &'static str,
}

const EASY: DifficultyProfile = DifficultyProfile {
    level: DifficultyLevel::Easy,
    duration_seconds: 40,
    spawn_interval_ms: 1000,
    object_lifetime_ms: 1100,
    good_score_delta: 10,
    bad_score_delta: -3,
    win_score_threshold: 100,
    label: "Easy",
};

const NORMAL: DifficultyProfile = DifficultyProfile {
    level: DifficultyLevel::Normal,
    duration_seconds: 30,
    spawn_interval_ms: 1000,
    object_lifetime_ms: 980,
    good_score_delta: 10,
    bad_score_delta: -5,
    win_score_threshold: 150,
    label: "Normal",
};

const HARD: DifficultyProfile = DifficultyProfile {
    level: DifficultyLevel::Hard,
    duration_seconds: 25,
    spawn_interval_ms: 750,
    object_lifetime_ms: 800,
    good_score_delta: 10,
    bad_score_delta: -8,
    win_score_threshold: 200,
    label: "Hard",
};

/// Look up a profile by name (`easy`, `normal`, `hard`; case-insensitive)
pub fn select(name: &str) -> EngineResult<DifficultyProfile> {
    let wanted = name.trim();
    DifficultyLevel::ALL
        .iter()
        .find(|level| level.to_string().eq_ignore_ascii_case(wanted))
        .map(|level| level.profile())
        .ok_or_else(|| EngineError::UnknownDifficulty(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn select_known_names() {
        assert_eq!(select("easy").unwrap().level, DifficultyLevel::Easy);
        assert_eq!(select("normal").unwrap().level, DifficultyLevel::Normal);
        assert_eq!(select("hard").unwrap().level, DifficultyLevel::Hard);
    }

    #[test]
    fn select_ignores_case_and_whitespace() {
        assert_eq!(select(" Normal ").unwrap(), NORMAL);
        assert_eq!(select("HARD").unwrap(), HARD);
    }

    #[test]
    fn select_unknown_name_fails() {
        assert_matches!(
            select("nightmare"),
            Err(EngineError::UnknownDifficulty(name)) if name == "nightmare"
        );
        assert_matches!(select(""), Err(EngineError::UnknownDifficulty(_)));
    }

    #[test]
    fn normal_profile_matches_classic_rules() {
        let p = select("normal").unwrap();
        assert_eq!(p.duration_seconds, 30);
        assert_eq!(p.good_score_delta, 10);
        assert_eq!(p.bad_score_delta, -5);
        assert_eq!(p.win_score_threshold, 150);
    }

    #[test]
    fn easy_lifetime_is_1100ms() {
        assert_eq!(select("easy").unwrap().object_lifetime_ms, 1100);
    }

    #[test]
    fn profiles_are_well_formed() {
        for level in DifficultyLevel::ALL {
            let p = level.profile();
            assert!(p.duration_seconds > 0);
            assert!(p.spawn_interval_ms > 0);
            assert!(p.object_lifetime_ms > 0);
            assert!(p.good_score_delta > 0);
            assert!(p.bad_score_delta < 0);
            assert!(p.win_score_threshold > 0);
            // lifetime stays within ~20% of the spawn interval
            assert!(p.object_lifetime_ms * 100 <= p.spawn_interval_ms * 120);
        }
    }

    #[test]
    fn level_display_is_lowercase() {
        assert_eq!(DifficultyLevel::Easy.to_string(), "easy");
        assert_eq!(DifficultyLevel::Hard.to_string(), "hard");
    }

    #[test]
    fn level_cycling_wraps() {
        assert_eq!(DifficultyLevel::Hard.next(), DifficultyLevel::Easy);
        assert_eq!(DifficultyLevel::Easy.previous(), DifficultyLevel::Hard);
        for level in DifficultyLevel::ALL {
            assert_eq!(level.next().previous(), level);
        }
    }
}
