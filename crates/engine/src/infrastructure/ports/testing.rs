//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniform index in `0..upper`; `upper` is always at least 1.
    fn gen_index(&self, upper: usize) -> usize;
}

/// Fisher-Yates shuffle driven by the port, so seeded and scripted
/// sources give reproducible orders.
pub fn shuffle<T>(random: &dyn RandomPort, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = random.gen_index(i + 1).min(i);
        items.swap(i, j);
    }
}
