use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Absolute 0-based frame index in sequence order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct FrameIndex(pub usize);

impl FrameIndex {
    /// The first frame of every sequence.
    pub const FIRST: Self = Self(0);

    /// Return `true` when the index addresses a frame of a `count`-frame sequence.
    pub fn in_bounds(self, count: usize) -> bool {
        self.0 < count
    }

    /// Validate the index against a `count`-frame sequence.
    pub fn checked(self, count: usize) -> FlipbookResult<Self> {
        if self.in_bounds(count) {
            Ok(self)
        } else {
            Err(FlipbookError::validation(format!(
                "frame {} out of range for {count} frames",
                self.0
            )))
        }
    }

    /// Index of the last frame of a non-empty `count`-frame sequence.
    pub fn last(count: usize) -> Self {
        Self(count.saturating_sub(1))
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Policy applied when playback steps past either end of the sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Clamp at the boundary and pause.
    Once,
    /// Wrap to the opposite boundary, keeping the direction.
    #[default]
    Loop,
    /// Clamp at the boundary and flip direction.
    Reflect,
}

impl LoopMode {
    /// Wire name (`once`, `loop`, `reflect`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Loop => "loop",
            Self::Reflect => "reflect",
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = FlipbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "loop" => Ok(Self::Loop),
            "reflect" => Ok(Self::Reflect),
            other => Err(FlipbookError::validation(format!(
                "unknown loop mode '{other}' (expected once, loop, or reflect)"
            ))),
        }
    }
}

/// Playback direction of an active timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Increasing frame indices.
    Forward,
    /// Decreasing frame indices.
    Reverse,
}

impl Direction {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
