//! Synth round enumeration
//!
//! Each legacy database is one generation ("round") of the same schema. The
//! round is the axis every per-round lookup is keyed on.

use crate::{Error, Result};
use std::fmt;

/// One of the four chronological legacy schema generations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SynthRound {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl SynthRound {
    /// All rounds in chronological order
    pub const ALL: [SynthRound; 4] = [
        SynthRound::One,
        SynthRound::Two,
        SynthRound::Three,
        SynthRound::Four,
    ];

    /// The most recent round, treated as authoritative for round-invariant lookups
    pub const LATEST: SynthRound = SynthRound::Four;

    /// Round number (1-4)
    pub fn value(self) -> i64 {
        self as i64
    }

    /// Zero-based position in the chronological source list
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// Human-readable round name as stored on the unified Round row
    pub fn label(self) -> String {
        format!("Synthesys {}", self.value())
    }

    /// Rounds oldest to newest
    pub fn chronological() -> impl DoubleEndedIterator<Item = SynthRound> {
        Self::ALL.into_iter()
    }

    /// Rounds newest to oldest
    pub fn newest_first() -> impl Iterator<Item = SynthRound> {
        Self::ALL.into_iter().rev()
    }
}

impl TryFrom<i64> for SynthRound {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(SynthRound::One),
            2 => Ok(SynthRound::Two),
            3 => Ok(SynthRound::Three),
            4 => Ok(SynthRound::Four),
            other => Err(Error::InvalidInput(format!(
                "Synth round must be between 1 and 4, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SynthRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
