//! Input plumbing between the terminal and the app loop.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, MouseEvent};

/// What the app loop reacts to
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    FocusLost,
    FocusGained,
    /// No input within one frame
    Tick,
}

impl GameEvent {
    /// Paste and other terminal events have no meaning here and map to `None`
    pub fn from_terminal(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) => Some(GameEvent::Key(key)),
            Event::Mouse(mouse) => Some(GameEvent::Mouse(mouse)),
            Event::Resize(w, h) => Some(GameEvent::Resize(w, h)),
            Event::FocusLost => Some(GameEvent::FocusLost),
            Event::FocusGained => Some(GameEvent::FocusGained),
            _ => None,
        }
    }
}

pub trait GameEventSource: Send + 'static {
    /// Wait up to `timeout` for the next event. `None` means nothing arrived.
    fn poll(&self, timeout: Duration) -> Option<GameEvent>;
}

/// Events pushed through an mpsc channel, by the input thread or by a test
pub struct ChannelEventSource {
    rx: Receiver<GameEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }

    pub fn pair() -> (Sender<GameEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl GameEventSource for ChannelEventSource {
    fn poll(&self, timeout: Duration) -> Option<GameEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Forward crossterm events from a background reader thread.
/// The thread exits on a read error or once the receiving side is dropped.
pub fn terminal_events() -> io::Result<ChannelEventSource> {
    let (tx, source) = ChannelEventSource::pair();
    thread::Builder::new()
        .name("terminal-input".into())
        .spawn(move || {
            while let Ok(raw) = event::read() {
                let Some(ev) = GameEvent::from_terminal(raw) else {
                    continue;
                };
                if tx.send(ev).is_err() {
                    break;
                }
            }
        })?;
    Ok(source)
}

pub trait FrameRate: Send + Sync + 'static {
    fn frame(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedFrameRate(Duration);

impl FixedFrameRate {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

impl FrameRate for FixedFrameRate {
    fn frame(&self) -> Duration {
        self.0
    }
}

/// Hands the app one event per call, or `Tick` when a frame passes quietly.
///
/// The frame tick only wakes the loop; session timing comes from the engine's
/// own clock, so a slow or bursty tick never changes the game's pace.
pub struct Runner<E: GameEventSource, F: FrameRate> {
    source: E,
    rate: F,
}

impl<E: GameEventSource, F: FrameRate> Runner<E, F> {
    pub fn new(source: E, rate: F) -> Self {
        Self { source, rate }
    }

    pub fn step(&self) -> GameEvent {
        self.source
            .poll(self.rate.frame())
            .unwrap_or(GameEvent::Tick)
    }
}
