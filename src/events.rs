use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::session::{HitResult, Verdict};
use crate::target::{Target, TargetId};

/// Everything the presentation layer might want to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    Spawned(Target),
    Expired(TargetId),
    HitResolved(HitResult),
    Ticked(u32),
    Ended(Verdict),
}

/// Observer for engine callbacks. Every method defaults to a no-op.
pub trait EventSink: Send {
    fn on_spawn(&mut self, _target: &Target) {}
    fn on_expire(&mut self, _id: TargetId) {}
    fn on_hit_resolved(&mut self, _result: &HitResult) {}
    fn on_tick(&mut self, _time_remaining: u32) {}
    fn on_ended(&mut self, _verdict: &Verdict) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}

/// Sink that queues events for later draining
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: VecDeque<EngineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventLog {
    fn on_spawn(&mut self, target: &Target) {
        self.push(EngineEvent::Spawned(target.clone()));
    }

    fn on_expire(&mut self, id: TargetId) {
        self.push(EngineEvent::Expired(id));
    }

    fn on_hit_resolved(&mut self, result: &HitResult) {
        self.push(EngineEvent::HitResolved(result.clone()));
    }

    fn on_tick(&mut self, time_remaining: u32) {
        self.push(EngineEvent::Ticked(time_remaining));
    }

    fn on_ended(&mut self, verdict: &Verdict) {
        self.push(EngineEvent::Ended(verdict.clone()));
    }
}

/// Lets the host keep a handle on a sink it hands to the engine
impl<S: EventSink> EventSink for Arc<Mutex<S>> {
    fn on_spawn(&mut self, target: &Target) {
        if let Ok(mut sink) = self.lock() {
            sink.on_spawn(target);
        }
    }

    fn on_expire(&mut self, id: TargetId) {
        if let Ok(mut sink) = self.lock() {
            sink.on_expire(id);
        }
    }

    fn on_hit_resolved(&mut self, result: &HitResult) {
        if let Ok(mut sink) = self.lock() {
            sink.on_hit_resolved(result);
        }
    }

    fn on_tick(&mut self, time_remaining: u32) {
        if let Ok(mut sink) = self.lock() {
            sink.on_tick(time_remaining);
        }
    }

    fn on_ended(&mut self, verdict: &Verdict) {
        if let Ok(mut sink) = self.lock() {
            sink.on_ended(verdict);
        }
    }
}
