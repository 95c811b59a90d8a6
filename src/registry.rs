use std::collections::BTreeMap;

use crate::target::{Target, TargetId};

/// Live, unresolved targets keyed by id.
///
/// Removal is the single point of resolution: whichever of `resolve` and
/// `sweep_expired` takes a target first owns it, the other sees nothing.
#[derive(Debug, Default, Clone)]
pub struct TargetRegistry {
    targets: BTreeMap<TargetId, Target>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: Target) {
        self.targets.insert(target.id, target);
    }

    /// Drop a target without resolving it. Absent ids are ignored.
    pub fn remove(&mut self, id: TargetId) {
        self.targets.remove(&id);
    }

    /// Take the target for a hit. `None` means it was already hit or swept.
    pub fn resolve(&mut self, id: TargetId) -> Option<Target> {
        self.targets.remove(&id)
    }

    /// Remove and return every target with `expires_at <= now`, oldest first
    pub fn sweep_expired(&mut self, now: u64) -> Vec<Target> {
        let expired: Vec<TargetId> = self
            .targets
            .values()
            .filter(|t| t.is_expired(now))
            .map(|t| t.id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.targets.remove(&id))
            .collect()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }

    /// Snapshot of live targets in spawn order
    pub fn live(&self) -> Vec<Target> {
        self.targets.values().cloned().collect()
    }

    /// Newest live target whose hit-area contains the point
    pub fn target_at(&self, x: f64, y: f64) -> Option<&Target> {
        self.targets.values().rev().find(|t| t.contains(x, y))
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Position, TargetKind};

    fn target(id: u64, spawned_at: u64, lifetime: u64) -> Target {
        Target {
            id: TargetId(id),
            kind: TargetKind::Good,
            spawned_at,
            expires_at: spawned_at + lifetime,
            position: Position { x: 0.0, y: 0.0 },
            size: 60,
        }
    }

    #[test]
    fn resolve_is_first_wins() {
        let mut reg = TargetRegistry::new();
        reg.add(target(1, 0, 1000));

        assert_eq!(reg.resolve(TargetId(1)).map(|t| t.id), Some(TargetId(1)));
        assert!(reg.resolve(TargetId(1)).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut reg = TargetRegistry::new();
        reg.add(target(1, 0, 1000));
        reg.remove(TargetId(1));
        reg.remove(TargetId(1));
        reg.remove(TargetId(42));
        assert!(reg.is_empty());
    }

    #[test]
    fn sweep_takes_only_expired() {
        let mut reg = TargetRegistry::new();
        reg.add(target(1, 0, 500));
        reg.add(target(2, 0, 1000));
        reg.add(target(3, 600, 1000));

        let swept = reg.sweep_expired(1000);
        let ids: Vec<_> = swept.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(reg.len(), 1);
        assert!(reg.get(TargetId(3)).is_some());
    }

    #[test]
    fn swept_target_cannot_be_resolved() {
        let mut reg = TargetRegistry::new();
        reg.add(target(1, 0, 1000));
        assert_eq!(reg.sweep_expired(1001).len(), 1);
        assert!(reg.resolve(TargetId(1)).is_none());
        assert!(reg.sweep_expired(5000).is_empty());
    }

    #[test]
    fn target_at_prefers_newest_overlap() {
        let mut reg = TargetRegistry::new();
        reg.add(target(1, 0, 1000));
        reg.add(target(2, 10, 1000));

        assert_eq!(reg.target_at(5.0, 5.0).map(|t| t.id), Some(TargetId(2)));
        assert!(reg.target_at(500.0, 5.0).is_none());
    }

    #[test]
    fn live_is_in_spawn_order() {
        let mut reg = TargetRegistry::new();
        reg.add(target(3, 0, 1000));
        reg.add(target(1, 0, 1000));
        reg.add(target(2, 0, 1000));
        let ids: Vec<_> = reg.live().into_iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
