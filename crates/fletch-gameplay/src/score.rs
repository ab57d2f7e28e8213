//! Match score.

use serde::{Deserialize, Serialize};

/// Monotonic score total, reset at match start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    total: u64,
}

impl ScoreLedger {
    /// Creates a ledger at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { total: 0 }
    }

    /// Adds to the total and returns the new total.
    pub fn add_score(&mut self, delta: u32) -> u64 {
        self.total = self.total.saturating_add(u64::from(delta));
        self.total
    }

    /// Current total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Starts a new match.
    pub fn reset(&mut self) {
        self.total = 0;
    }
}
