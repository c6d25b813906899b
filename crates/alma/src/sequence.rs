//! Monotonic id allocation.

use crate::config::ListConfig;
use crate::error::{PreconditionViolation, Result};

/// Largest integer that survives a round-trip through an IEEE-754 double,
/// i.e. through any JSON consumer.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// An increasing integer sequence that wraps or fails at its maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    start: u64,
    max: u64,
    wrap: bool,
    next: u64,
}

impl IdSequence {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            start: config.start,
            max: config.max,
            wrap: config.wrap,
            next: config.start,
        }
    }

    /// Draw the next id.
    ///
    /// # Errors
    ///
    /// [`PreconditionViolation::SequenceExhausted`] when the maximum is
    /// reached and wrapping is disabled.
    pub fn next_id(&mut self) -> Result<u64> {
        if self.next >= self.max {
            if !self.wrap {
                return Err(PreconditionViolation::SequenceExhausted(self.max).into());
            }
            self.next = self.start;
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    /// Resume the sequence one past `id`.
    pub fn seed_above(&mut self, id: u64) {
        self.next = id.saturating_add(1).max(self.start);
    }

    /// The id the next draw will return, ignoring wrap-around.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Restart from the configured start.
    pub fn reset(&mut self) {
        self.next = self.start;
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new(&ListConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KernelError;

    #[test]
    fn test_starts_at_one() {
        let mut seq = IdSequence::default();
        assert_eq!(seq.next_id().unwrap(), 1);
        assert_eq!(seq.next_id().unwrap(), 2);
    }

    #[test]
    fn test_seed_above() {
        let mut seq = IdSequence::default();
        seq.seed_above(5);
        assert_eq!(seq.next_id().unwrap(), 6);
        seq.reset();
        assert_eq!(seq.next_id().unwrap(), 1);
    }

    #[test]
    fn test_wraps_at_max() {
        let mut seq = IdSequence::new(&ListConfig {
            start: 1,
            max: 3,
            wrap: true,
        });
        assert_eq!(seq.next_id().unwrap(), 1);
        assert_eq!(seq.next_id().unwrap(), 2);
        assert_eq!(seq.next_id().unwrap(), 1);
    }

    #[test]
    fn test_fails_at_max_without_wrap() {
        let mut seq = IdSequence::new(&ListConfig {
            start: 1,
            max: 2,
            wrap: false,
        });
        assert_eq!(seq.next_id().unwrap(), 1);
        assert_eq!(
            seq.next_id(),
            Err(KernelError::Precondition(
                PreconditionViolation::SequenceExhausted(2)
            ))
        );
    }
}
