use thiserror::Error;

/// Errors surfaced to callers of the session engine.
///
/// Duplicate or late hits and degenerate play areas are not errors; they are
/// reported through `HitResult::applied` and spawn-range clamping instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown difficulty: {0:?} (expected one of easy, normal, hard)")]
    UnknownDifficulty(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
