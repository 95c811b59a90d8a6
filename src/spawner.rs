use tracing::debug;

use crate::difficulty::DifficultyProfile;
use crate::registry::TargetRegistry;
use crate::rng::RandomSource;
use crate::session::SessionStatus;
use crate::target::{PlayArea, Position, Target, TargetId, TargetKind};

pub const GOOD_PROBABILITY: f64 = 0.7;
pub const MIN_TARGET_SIZE: u32 = 48;
pub const MAX_TARGET_SIZE: u32 = 80;

/// Decides what appears on each spawn tick.
///
/// Ids keep counting across sessions, so a stale id from an earlier session
/// can never alias a live target.
pub struct SpawnScheduler {
    rng: Box<dyn RandomSource>,
    next_id: u64,
}

impl SpawnScheduler {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng, next_id: 1 }
    }

    /// Spawn one target into `registry` if the session is running
    pub fn tick(
        &mut self,
        status: SessionStatus,
        now: u64,
        profile: &DifficultyProfile,
        area: PlayArea,
        registry: &mut TargetRegistry,
    ) -> Option<Target> {
        if status != SessionStatus::Running {
            return None;
        }
        let target = self.generate(now, profile, area);
        debug!(
            id = target.id.0,
            kind = %target.kind,
            size = target.size,
            x = target.position.x,
            y = target.position.y,
            "spawned target"
        );
        registry.add(target.clone());
        Some(target)
    }

    fn generate(&mut self, now: u64, profile: &DifficultyProfile, area: PlayArea) -> Target {
        let kind = if self.rng.chance(GOOD_PROBABILITY) {
            TargetKind::Good
        } else {
            TargetKind::Bad
        };
        let size = self.rng.int_in(MIN_TARGET_SIZE, MAX_TARGET_SIZE);
        let max = area.max_origin(size);
        let position = Position {
            x: self.rng.fraction() * max.x,
            y: self.rng.fraction() * max.y,
        };

        let id = TargetId(self.next_id);
        self.next_id += 1;

        Target {
            id,
            kind,
            spawned_at: now,
            expires_at: now + profile.object_lifetime_ms,
            position,
            size,
        }
    }
}
