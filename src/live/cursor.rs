//! Event-log cursor.
//!
//! The log only grows during a match. The cursor remembers how many records
//! were seen, so each new snapshot yields exactly the appended tail. A log
//! shorter than the cursor means a new match started; the cursor then
//! restarts from zero and the whole new log counts as new.

// ============================================================================
// Imports
// ============================================================================

use tracing::info;

// ============================================================================
// EventCursor
// ============================================================================

/// Count of event records already delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCursor {
    position: usize,
}

impl EventCursor {
    /// Creates a cursor at zero.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// Returns the number of records already delivered.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the records appended since the last call and moves to the end.
    pub fn advance<'a, T>(&mut self, log: &'a [T]) -> &'a [T] {
        if log.len() < self.position {
            info!(
                previous = self.position,
                current = log.len(),
                "Event log shrank, assuming a new match"
            );
            self.position = 0;
        }

        let appended = &log[self.position..];
        self.position = log.len();
        appended
    }

    /// Moves back to zero.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================
