//! Periodic drivers for spawning and the countdown.
//!
//! Nothing here sleeps or spawns threads. The owner polls `due(now)` and
//! receives the ticks that should have fired since the last poll, in firing
//! order. Each tick carries the epoch it was scheduled in; `start` and `stop`
//! open a new epoch, so a tick held onto across a reset is recognisably stale.

pub const COUNTDOWN_PERIOD_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum DriverKind {
    Countdown,
    Spawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTick {
    pub kind: DriverKind,
    pub epoch: u64,
    pub due_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Stopped,
    Armed { next_due: u64 },
    Paused { remaining: u64 },
}

#[derive(Debug, Clone, Copy)]
struct PeriodicDriver {
    kind: DriverKind,
    period: u64,
    state: DriverState,
}

impl PeriodicDriver {
    fn new(kind: DriverKind) -> Self {
        Self {
            kind,
            period: 0,
            state: DriverState::Stopped,
        }
    }

    fn arm(&mut self, now: u64, period: u64) {
        self.period = period.max(1);
        self.state = DriverState::Armed {
            next_due: now + self.period,
        };
    }

    fn next_due(&self) -> Option<u64> {
        match self.state {
            DriverState::Armed { next_due } => Some(next_due),
            _ => None,
        }
    }

    fn fire(&mut self) {
        if let DriverState::Armed { next_due } = self.state {
            self.state = DriverState::Armed {
                next_due: next_due + self.period,
            };
        }
    }

    fn pause(&mut self, now: u64) {
        if let DriverState::Armed { next_due } = self.state {
            self.state = DriverState::Paused {
                remaining: next_due.saturating_sub(now).max(1),
            };
        }
    }

    fn resume(&mut self, now: u64) {
        if let DriverState::Paused { remaining } = self.state {
            self.state = DriverState::Armed {
                next_due: now + remaining,
            };
        }
    }
}

/// The spawn and countdown drivers of one session
#[derive(Debug, Clone)]
pub struct Drivers {
    countdown: PeriodicDriver,
    spawn: PeriodicDriver,
    epoch: u64,
}

impl Drivers {
    pub fn new() -> Self {
        Self {
            countdown: PeriodicDriver::new(DriverKind::Countdown),
            spawn: PeriodicDriver::new(DriverKind::Spawn),
            epoch: 0,
        }
    }

    /// Arm both drivers; the first ticks fire one period after `now`
    pub fn start(&mut self, now: u64, spawn_period_ms: u64) {
        self.epoch += 1;
        self.countdown.arm(now, COUNTDOWN_PERIOD_MS);
        self.spawn.arm(now, spawn_period_ms);
    }

    pub fn stop(&mut self) {
        self.epoch += 1;
        self.countdown.state = DriverState::Stopped;
        self.spawn.state = DriverState::Stopped;
    }

    pub fn pause(&mut self, now: u64) {
        self.countdown.pause(now);
        self.spawn.pause(now);
    }

    pub fn resume(&mut self, now: u64) {
        self.countdown.resume(now);
        self.spawn.resume(now);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_armed(&self) -> bool {
        self.countdown.next_due().is_some() || self.spawn.next_due().is_some()
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.countdown.state, DriverState::Paused { .. })
            || matches!(self.spawn.state, DriverState::Paused { .. })
    }

    /// Pop the earliest tick due at or before `now`. Countdown wins ties.
    pub fn next_due(&mut self, now: u64) -> Option<DriverTick> {
        let driver = [&mut self.countdown, &mut self.spawn]
            .into_iter()
            .filter(|d| d.next_due().is_some_and(|due| due <= now))
            .min_by_key(|d| d.next_due())?;

        let due_at = driver.next_due()?;
        let kind = driver.kind;
        driver.fire();
        Some(DriverTick {
            kind,
            epoch: self.epoch,
            due_at,
        })
    }

    /// All ticks due up to `now`, in firing order
    pub fn due(&mut self, now: u64) -> Vec<DriverTick> {
        std::iter::from_fn(|| self.next_due(now)).collect()
    }
}

impl Default for Drivers {
    fn default() -> Self {
        Self::new()
    }
}
