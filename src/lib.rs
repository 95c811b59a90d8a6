// Library surface for headless/integration tests and reuse.
// The terminal frontend (main.rs, ui.rs) stays bin-only.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod rng;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod spawner;
pub mod target;

pub use difficulty::{DifficultyLevel, DifficultyProfile};
pub use engine::SessionStateMachine;
pub use error::EngineError;
pub use session::{HitResult, SessionStatus, Verdict, VerdictStatus};
pub use target::{PlayArea, Target, TargetId, TargetKind};
