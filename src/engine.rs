//! Session state machine: Idle -> Running -> Ended -> Idle.
//!
//! All mutation goes through `&mut self`, so a host that runs real timers on
//! other threads has to funnel them through one owner (a channel into the
//! event loop, or a mutex around the machine). Driver ticks are re-checked
//! against the current epoch and status before they touch anything.

use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::difficulty::{self, DifficultyLevel, DifficultyProfile};
use crate::drivers::{DriverKind, DriverTick, Drivers};
use crate::error::EngineResult;
use crate::events::{EventSink, NullSink};
use crate::rng::{RandomSource, SeededRandom};
use crate::scoring::ScoringEngine;
use crate::session::{HitResult, Session, SessionStatus, Verdict};
use crate::spawner::SpawnScheduler;
use crate::target::{PlayArea, Target, TargetId};

/// Seed offset for the scoring stream so it never mirrors the spawn stream
const SCORING_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct SessionStateMachine {
    session: Session,
    drivers: Drivers,
    spawner: SpawnScheduler,
    scoring: ScoringEngine,
    clock: Box<dyn Clock>,
    sink: Box<dyn EventSink>,
    area: PlayArea,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            session: Session::default(),
            drivers: Drivers::new(),
            spawner: SpawnScheduler::new(Box::new(SeededRandom::from_entropy())),
            scoring: ScoringEngine::new(Box::new(SeededRandom::from_entropy())),
            clock: Box::new(SystemClock::new()),
            sink: Box::new(NullSink),
            area: PlayArea::default(),
        }
    }

    /// Seed both random streams for a repeatable session
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_spawn_random(SeededRandom::from_seed(seed))
            .with_scoring_random(SeededRandom::from_seed(seed ^ SCORING_SEED_SALT))
    }

    pub fn with_spawn_random<R: RandomSource + 'static>(mut self, rng: R) -> Self {
        self.spawner = SpawnScheduler::new(Box::new(rng));
        self
    }

    pub fn with_scoring_random<R: RandomSource + 'static>(mut self, rng: R) -> Self {
        self.scoring = ScoringEngine::new(Box::new(rng));
        self
    }

    pub fn with_clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sink<S: EventSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_play_area(mut self, area: PlayArea) -> Self {
        self.area = area;
        self
    }

    /// Begin a fresh session. Fails without touching the current one when the
    /// name is not a known difficulty.
    pub fn start(&mut self, difficulty_name: &str) -> EngineResult<()> {
        let profile = difficulty::select(difficulty_name)?;
        self.start_with(profile);
        Ok(())
    }

    pub fn start_level(&mut self, level: DifficultyLevel) {
        self.start_with(level.profile());
    }

    fn start_with(&mut self, profile: DifficultyProfile) {
        let now = self.clock.now_ms();
        self.drivers.stop();
        self.session.restart(profile);
        self.drivers.start(now, profile.spawn_interval_ms);
        info!(
            difficulty = profile.label,
            duration = profile.duration_seconds,
            epoch = self.drivers.epoch(),
            "session started"
        );
    }

    /// Fire every driver tick that has come due, sweeping expired targets at
    /// each tick's due time and once more at the current time.
    pub fn advance(&mut self) {
        let now = self.clock.now_ms();
        self.run_due(now);
        if self.session.is_running() {
            self.sweep(now);
        }
    }

    /// Deliver driver ticks due at or before `until`, stopping once the session ends
    fn run_due(&mut self, until: u64) {
        while self.session.is_running() {
            match self.drivers.next_due(until) {
                Some(tick) => self.deliver(tick),
                None => break,
            }
        }
    }

    /// Apply one driver tick. Stale, paused or out-of-session ticks are dropped.
    pub fn deliver(&mut self, tick: DriverTick) {
        if tick.epoch != self.drivers.epoch()
            || !self.session.is_running()
            || self.drivers.is_paused()
        {
            trace!(kind = %tick.kind, epoch = tick.epoch, "discarded driver tick");
            return;
        }
        self.sweep(tick.due_at);
        match tick.kind {
            DriverKind::Countdown => self.tick(),
            DriverKind::Spawn => self.spawn_at(tick.due_at),
        }
    }

    /// One countdown step. Reaching zero ends the session.
    pub fn tick(&mut self) {
        if !self.session.is_running() {
            return;
        }
        let out_of_time = self.session.drain_time(1);
        self.sink.on_tick(self.session.time_remaining_seconds);
        if out_of_time {
            self.finish();
        }
    }

    fn spawn_at(&mut self, now: u64) {
        let spawned = self.spawner.tick(
            self.session.status,
            now,
            &self.session.difficulty,
            self.area,
            &mut self.session.registry,
        );
        if let Some(target) = spawned {
            self.sink.on_spawn(&target);
        }
    }

    fn sweep(&mut self, now: u64) {
        for target in self.session.registry.sweep_expired(now) {
            debug!(id = target.id.0, kind = %target.kind, "target missed");
            self.sink.on_expire(target.id);
        }
    }

    /// Resolve a hit on `target_id` observed at `observed_at` (clock ms).
    ///
    /// Only the first hit on a live target applies. A hit observed at or after
    /// the target's expiry counts as a miss and removes the target.
    pub fn register_hit(&mut self, target_id: TargetId, observed_at: u64) -> HitResult {
        // the countdown may have run out since the host last advanced
        self.run_due(observed_at.min(self.clock.now_ms()));
        if !self.session.is_running() {
            return self.session.rejected_hit(target_id);
        }

        let expired = match self.session.registry.get(target_id) {
            Some(target) => target.is_expired(observed_at),
            None => return self.session.rejected_hit(target_id),
        };
        if expired {
            self.session.registry.remove(target_id);
            debug!(id = target_id.0, observed_at, "late hit treated as miss");
            self.sink.on_expire(target_id);
            return self.session.rejected_hit(target_id);
        }

        let Some(target) = self.session.registry.resolve(target_id) else {
            return self.session.rejected_hit(target_id);
        };

        let outcome = self.scoring.apply_hit(target.kind, &self.session.difficulty);
        self.session.score += outcome.score_delta;
        let penalty = outcome.time_penalty_seconds;
        let out_of_time = penalty > 0 && self.session.drain_time(penalty);

        let result = HitResult {
            target_id,
            applied: true,
            kind: Some(target.kind),
            score_delta: outcome.score_delta,
            time_penalty_seconds: outcome.time_penalty_seconds,
            new_score: self.session.score,
            new_time_remaining: self.session.time_remaining_seconds,
        };
        debug!(
            id = target_id.0,
            kind = %target.kind,
            delta = outcome.score_delta,
            penalty = outcome.time_penalty_seconds,
            score = self.session.score,
            "hit applied"
        );
        self.sink.on_hit_resolved(&result);

        if out_of_time {
            self.finish();
        }
        result
    }

    /// Stop the session and compute the verdict.
    ///
    /// Returns `None` if no session has run since the last reset. Calling it
    /// again after the session ended returns the same verdict unchanged.
    pub fn end(&mut self) -> Option<Verdict> {
        match self.session.status {
            SessionStatus::Idle => None,
            SessionStatus::Ended => self.session.verdict.clone(),
            SessionStatus::Running => Some(self.finish()),
        }
    }

    fn finish(&mut self) -> Verdict {
        self.drivers.stop();
        let verdict = Verdict::compute(self.session.score, &self.session.difficulty);
        self.session.status = SessionStatus::Ended;
        self.session.verdict = Some(verdict.clone());
        info!(
            verdict = %verdict.status,
            score = verdict.final_score,
            threshold = verdict.threshold,
            "session ended"
        );
        self.sink.on_ended(&verdict);
        verdict
    }

    /// Abandon whatever is happening and return to the menu. Always safe.
    pub fn reset_to_menu(&mut self) {
        self.drivers.stop();
        let difficulty = self.session.difficulty;
        self.session = Session::new(difficulty);
        info!("returned to menu");
    }

    /// Freeze spawning and the countdown. Live targets keep their expiry.
    pub fn pause(&mut self) {
        if self.session.is_running() && !self.drivers.is_paused() {
            self.drivers.pause(self.clock.now_ms());
            info!(time_remaining = self.session.time_remaining_seconds, "session paused");
        }
    }

    pub fn resume(&mut self) {
        if self.session.is_running() && self.drivers.is_paused() {
            self.drivers.resume(self.clock.now_ms());
            info!("session resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_running() && self.drivers.is_paused()
    }

    pub fn current_score(&self) -> i64 {
        self.session.score
    }

    pub fn current_time_remaining(&self) -> u32 {
        self.session.time_remaining_seconds
    }

    pub fn live_targets(&self) -> Vec<Target> {
        self.session.registry.live()
    }

    pub fn target_at(&self, x: f64, y: f64) -> Option<&Target> {
        self.session.registry.target_at(x, y)
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn difficulty(&self) -> &DifficultyProfile {
        &self.session.difficulty
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.session.verdict.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The current driver epoch, for hosts that produce their own ticks
    pub fn epoch(&self) -> u64 {
        self.drivers.epoch()
    }

    pub fn play_area(&self) -> PlayArea {
        self.area
    }

    /// Resize the spawn surface; only future spawns are affected
    pub fn set_play_area(&mut self, area: PlayArea) {
        self.area = area;
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::EngineError;
    use crate::events::{EngineEvent, EventLog};
    use crate::rng::ScriptedRandom;
    use crate::session::VerdictStatus;
    use crate::target::TargetKind;
    use assert_matches::assert_matches;
    use std::sync::{Arc, Mutex};

    fn machine(clock: &ManualClock) -> SessionStateMachine {
        SessionStateMachine::new()
            .with_clock(clock.clone())
            .with_seed(7)
    }

    /// Spawn stream that always yields a good target of size 48 at the origin
    fn all_good() -> ScriptedRandom {
        ScriptedRandom::new().with_chances(std::iter::repeat(true).take(1000))
    }

    #[test]
    fn starts_idle() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        assert_eq!(m.status(), SessionStatus::Idle);
        assert!(m.end().is_none());
        m.advance();
        assert!(m.live_targets().is_empty());
    }

    #[test]
    fn start_sets_time_and_score() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        for level in DifficultyLevel::ALL {
            m.start(&level.to_string()).unwrap();
            assert_eq!(m.status(), SessionStatus::Running);
            assert_eq!(m.current_score(), 0);
            assert_eq!(m.current_time_remaining(), level.profile().duration_seconds);
        }
    }

    #[test]
    fn unknown_difficulty_leaves_session_alone() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        assert_matches!(m.start("extreme"), Err(EngineError::UnknownDifficulty(_)));
        assert_eq!(m.status(), SessionStatus::Idle);

        m.start("normal").unwrap();
        clock.advance(3000);
        m.advance();
        assert_matches!(m.start("bogus"), Err(EngineError::UnknownDifficulty(_)));
        assert_eq!(m.status(), SessionStatus::Running);
        assert_eq!(m.current_time_remaining(), 27);
    }

    #[test]
    fn spawns_once_per_interval() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("hard").unwrap();

        clock.advance(749);
        m.advance();
        assert!(m.live_targets().is_empty());

        clock.advance(1);
        m.advance();
        let live = m.live_targets();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].spawned_at, 750);
        assert_eq!(live[0].expires_at, 1550);
    }

    #[test]
    fn expired_targets_are_swept_without_score_change() {
        let clock = ManualClock::new(0);
        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut m = machine(&clock)
            .with_spawn_random(all_good())
            .with_sink(log.clone());
        m.start("normal").unwrap();

        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;

        clock.set(1980);
        m.advance();
        assert!(m.live_targets().is_empty());
        assert_eq!(m.current_score(), 0);

        let events = log.lock().unwrap().drain();
        assert!(events.contains(&EngineEvent::Expired(id)));
    }

    #[test]
    fn countdown_reaching_zero_ends_session() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        m.start("normal").unwrap();

        let mut last = m.current_time_remaining();
        for _ in 0..29 {
            clock.advance(1000);
            m.advance();
            assert!(m.current_time_remaining() <= last);
            last = m.current_time_remaining();
        }
        assert_eq!(m.status(), SessionStatus::Running);
        assert_eq!(m.current_time_remaining(), 1);

        clock.advance(1000);
        m.advance();
        assert_eq!(m.current_time_remaining(), 0);
        assert_eq!(m.status(), SessionStatus::Ended);
        assert_eq!(m.verdict().map(|v| v.status), Some(VerdictStatus::Lose));
    }

    #[test]
    fn long_gap_stops_at_zero() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        m.start("hard").unwrap();
        clock.advance(120_000);
        m.advance();
        assert_eq!(m.current_time_remaining(), 0);
        assert_eq!(m.status(), SessionStatus::Ended);
    }

    #[test]
    fn hit_applies_once() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("normal").unwrap();
        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;

        let first = m.register_hit(id, 1200);
        assert!(first.applied);
        assert_eq!(first.kind, Some(TargetKind::Good));
        assert_eq!(first.new_score, 10);

        let second = m.register_hit(id, 1201);
        assert!(!second.applied);
        assert_eq!(second.score_delta, 0);
        assert_eq!(second.new_score, 10);
    }

    #[test]
    fn late_hit_is_a_miss() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("normal").unwrap();
        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;

        let late = m.register_hit(id, 1980);
        assert!(!late.applied);
        assert_eq!(m.current_score(), 0);
        assert!(m.live_targets().is_empty());
    }

    #[test]
    fn unknown_target_is_ignored() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        m.start("normal").unwrap();
        let r = m.register_hit(TargetId(999), 10);
        assert!(!r.applied);
        assert_eq!(r.new_time_remaining, 30);
    }

    #[test]
    fn penalty_at_one_second_ends_session() {
        let clock = ManualClock::new(0);
        let spawn = ScriptedRandom::new().with_chances([false]);
        let scoring = ScriptedRandom::new().with_chances([true]);
        let mut m = machine(&clock)
            .with_spawn_random(spawn)
            .with_scoring_random(scoring)
            .with_play_area(PlayArea::new(2000.0, 2000.0));
        m.start("normal").unwrap();

        // advancing to 1000 fires one countdown tick and the first spawn
        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;
        for _ in 0..28 {
            m.tick();
        }
        assert_eq!(m.current_time_remaining(), 1);

        let r = m.register_hit(id, 1100);
        assert!(r.applied);
        assert_eq!(r.kind, Some(TargetKind::Bad));
        assert_eq!(r.time_penalty_seconds, 2);
        assert_eq!(r.new_time_remaining, 0);
        assert_eq!(r.new_score, -5);
        assert_eq!(m.status(), SessionStatus::Ended);
    }

    #[test]
    fn end_is_idempotent() {
        let clock = ManualClock::new(0);
        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut m = machine(&clock).with_sink(log.clone());
        m.start("easy").unwrap();

        let first = m.end().unwrap();
        let second = m.end().unwrap();
        assert_eq!(first, second);
        assert_eq!(m.status(), SessionStatus::Ended);

        let ended = log
            .lock()
            .unwrap()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::Ended(_)))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn nothing_moves_after_end() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("normal").unwrap();
        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;
        m.end();

        let stale = DriverTick {
            kind: DriverKind::Countdown,
            epoch: 1,
            due_at: 2000,
        };
        clock.set(10_000);
        m.advance();
        m.deliver(stale);
        m.tick();
        assert_eq!(m.current_time_remaining(), 29);
        assert!(!m.register_hit(id, 1100).applied);
        assert_eq!(m.current_score(), 0);
    }

    #[test]
    fn stale_tick_after_restart_is_discarded() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        m.start("normal").unwrap();
        let old_epoch = m.epoch();

        m.reset_to_menu();
        m.start("normal").unwrap();
        m.deliver(DriverTick {
            kind: DriverKind::Countdown,
            epoch: old_epoch,
            due_at: 1000,
        });
        assert_eq!(m.current_time_remaining(), 30);

        m.deliver(DriverTick {
            kind: DriverKind::Countdown,
            epoch: m.epoch(),
            due_at: 1000,
        });
        assert_eq!(m.current_time_remaining(), 29);
    }

    #[test]
    fn reset_clears_targets_and_returns_to_idle() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("easy").unwrap();
        clock.set(1000);
        m.advance();
        assert_eq!(m.live_targets().len(), 1);

        m.reset_to_menu();
        assert_eq!(m.status(), SessionStatus::Idle);
        assert!(m.live_targets().is_empty());
        assert!(m.verdict().is_none());

        clock.set(5000);
        m.advance();
        assert!(m.live_targets().is_empty());

        m.start("easy").unwrap();
        assert!(m.live_targets().is_empty());
        assert_eq!(m.current_score(), 0);
        clock.set(6000);
        m.advance();
        assert_eq!(m.live_targets().len(), 1);
    }

    #[test]
    fn reset_is_safe_from_any_state() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        m.reset_to_menu();
        m.start("hard").unwrap();
        m.end();
        m.reset_to_menu();
        m.reset_to_menu();
        assert_eq!(m.status(), SessionStatus::Idle);
    }

    #[test]
    fn pause_freezes_countdown_and_spawns() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("normal").unwrap();

        clock.set(500);
        m.pause();
        assert!(m.is_paused());
        clock.set(60_000);
        m.advance();
        assert_eq!(m.current_time_remaining(), 30);
        assert!(m.live_targets().is_empty());

        m.resume();
        clock.set(60_500);
        m.advance();
        assert_eq!(m.current_time_remaining(), 29);
        assert_eq!(m.live_targets().len(), 1);
    }

    #[test]
    fn delivered_ticks_are_dropped_while_paused() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("normal").unwrap();
        let epoch = m.epoch();

        clock.set(200);
        m.pause();
        for kind in [DriverKind::Countdown, DriverKind::Spawn] {
            m.deliver(DriverTick {
                kind,
                epoch,
                due_at: 1000,
            });
        }
        assert_eq!(m.current_time_remaining(), 30);
        assert!(m.live_targets().is_empty());

        m.resume();
        m.deliver(DriverTick {
            kind: DriverKind::Countdown,
            epoch,
            due_at: 1000,
        });
        assert_eq!(m.current_time_remaining(), 29);
    }

    #[test]
    fn hit_after_final_countdown_tick_is_rejected() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("easy").unwrap();

        for second in 1..=9u64 {
            clock.set(second * 1000);
            m.advance();
            let id = m.live_targets().last().unwrap().id;
            assert!(m.register_hit(id, second * 1000).applied);
        }
        assert_eq!(m.current_score(), 90);

        clock.set(39_990);
        m.advance();
        assert_eq!(m.current_time_remaining(), 1);
        let last = m.live_targets().last().unwrap().clone();
        assert_eq!(last.spawned_at, 39_000);
        assert_eq!(last.expires_at, 40_100);

        // the countdown hits zero at 40_000 but nobody advanced before the click
        clock.set(40_050);
        let hit = m.register_hit(last.id, 40_050);
        assert!(!hit.applied);
        assert_eq!(hit.new_time_remaining, 0);
        assert_eq!(m.status(), SessionStatus::Ended);

        m.advance();
        let verdict = m.end().unwrap();
        assert_eq!(verdict.status, VerdictStatus::Lose);
        assert_eq!(verdict.final_score, 90);
    }

    #[test]
    fn hit_observed_before_a_due_tick_still_counts() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("easy").unwrap();
        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;

        // clock has moved past the next countdown tick, the click happened before it
        clock.set(2050);
        let hit = m.register_hit(id, 1990);
        assert!(hit.applied);
        assert_eq!(hit.new_time_remaining, 39);
        m.advance();
        assert_eq!(m.current_time_remaining(), 38);
    }

    #[test]
    fn pause_is_ignored_outside_running() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock);
        m.pause();
        assert!(!m.is_paused());
        m.start("normal").unwrap();
        m.end();
        m.pause();
        assert!(!m.is_paused());
    }

    #[test]
    fn events_follow_the_session() {
        let clock = ManualClock::new(0);
        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut m = machine(&clock)
            .with_spawn_random(all_good())
            .with_sink(log.clone());
        m.start("normal").unwrap();
        clock.set(1000);
        m.advance();
        let id = m.live_targets()[0].id;
        m.register_hit(id, 1001);

        let events = log.lock().unwrap().drain();
        assert_matches!(events[0], EngineEvent::Ticked(29));
        assert_matches!(&events[1], EngineEvent::Spawned(t) if t.id == id);
        assert_matches!(&events[2], EngineEvent::HitResolved(r) if r.applied && r.new_score == 10);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn target_at_maps_points_to_targets() {
        let clock = ManualClock::new(0);
        let mut m = machine(&clock).with_spawn_random(all_good());
        m.start("normal").unwrap();
        clock.set(1000);
        m.advance();

        let t = m.live_targets()[0].clone();
        let hit = m.target_at(t.position.x + 1.0, t.position.y + 1.0);
        assert_eq!(hit.map(|x| x.id), Some(t.id));
        assert!(m.target_at(-1.0, -1.0).is_none());
    }
}
