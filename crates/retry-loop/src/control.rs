//! The cooperative stop signal handed to each unit of work.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct LoopState {
    ended: AtomicBool,
    iteration: AtomicUsize,
}

/// Handle through which a unit of work ends its retry loop.
///
/// Every call to [`RetryLoop::execute`](crate::RetryLoop::execute) creates
/// its own `LoopControl`, so overlapping or repeated calls on the same loop
/// never observe each other's state. Cloning is cheap; clones share state.
#[derive(Debug, Clone, Default)]
pub struct LoopControl {
    state: Arc<LoopState>,
}

impl LoopControl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Ends the loop once the current invocation of the work returns.
    ///
    /// The current invocation is not interrupted. Calling this more than
    /// once has the same effect as calling it once.
    pub fn stop(&self) {
        self.state.ended.store(true, Ordering::Release);
    }

    /// Returns true if [`stop`](Self::stop) has been called during this execution.
    pub fn is_stopped(&self) -> bool {
        self.state.ended.load(Ordering::Acquire)
    }

    /// Returns the 1-based number of the invocation currently running.
    pub fn iteration(&self) -> usize {
        self.state.iteration.load(Ordering::Acquire)
    }

    pub(crate) fn begin_iteration(&self) -> usize {
        self.state.iteration.fetch_add(1, Ordering::AcqRel) + 1
    }
}
