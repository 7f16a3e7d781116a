//! Outbound message identifier generation.

use std::sync::atomic::{AtomicU32, Ordering};

/// Monotonic 32-bit identifier source for outbound messages.
///
/// Lock-free; safe to share across any number of tasks. The counter wraps
/// on overflow, so identifiers are unique only within one wrap period.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU32,
}

impl IdGenerator {
    /// Creates a generator whose first identifier is 1.
    pub const fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    /// Creates a generator whose next identifier is `last.wrapping_add(1)`.
    pub const fn starting_after(last: u32) -> Self {
        Self {
            counter: AtomicU32::new(last),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> u32 {
        // fetch_add wraps on overflow for atomics
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Returns the most recently issued identifier (0 if none yet).
    pub fn current(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }
}
