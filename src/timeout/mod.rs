//! Timeout budget tracking.
//!
//! # Responsibilities
//! - Track a single wall-clock time budget across a multi-step workflow
//! - Yield the remaining time at each call site, floored at zero
//! - Let each step decide how to spend its remaining allotment
//!
//! # Design Decisions
//! - Read-only from the workflow's perspective; no side effects beyond clock reads
//! - Remaining time is never negative
//! - Each step reads the budget once, immediately before its I/O

use std::time::{Duration, Instant};

/// A fixed time budget shared by the steps of one workflow invocation.
///
/// Constructed once at the start of the invocation; each step calls
/// [`TimeoutBudget::remaining`] just before performing I/O so a slow step
/// never grants a later step a larger-than-intended window.
#[derive(Debug, Clone)]
pub struct TimeoutBudget {
    total: Duration,
    started: Instant,
}

impl TimeoutBudget {
    /// Start a new budget of `total` duration, measured from now.
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            started: Instant::now(),
        }
    }

    /// Time left in the budget, floored at zero.
    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.started.elapsed())
    }

    /// Wall-clock time elapsed since the budget was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the budget has been fully consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// The total duration this budget was constructed with.
    pub fn total(&self) -> Duration {
        self.total
    }
}
