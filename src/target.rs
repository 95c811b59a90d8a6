use serde::Serialize;

/// Session-unique target identifier, assigned in spawn order starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Jerry cans are good, pollutants are bad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum TargetKind {
    Good,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Size of the surface targets spawn on, in play-area units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayArea {
    pub width: f64,
    pub height: f64,
}

impl PlayArea {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Largest top-left coordinate that keeps a square of `size` inside the
    /// area. Dimensions smaller than `size` (or non-positive) clamp to 0.
    pub fn max_origin(&self, size: u32) -> Position {
        let size = f64::from(size);
        Position {
            x: clamp_span(self.width - size),
            y: clamp_span(self.height - size),
        }
    }
}

impl Default for PlayArea {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

fn clamp_span(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// One spawned object, owned by the registry until hit or expired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    pub spawned_at: u64,
    pub expires_at: u64,
    pub position: Position,
    pub size: u32,
}

impl Target {
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= now
    }

    /// Hit test against the square hit-area
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let size = f64::from(self.size);
        x >= self.position.x
            && x < self.position.x + size
            && y >= self.position.y
            && y < self.position.y + size
    }
}
