//! Events emitted while a retry loop runs.

use crate::timeout::Timeout;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Events emitted by a [`RetryLoop`](crate::RetryLoop).
#[derive(Debug, Clone)]
pub enum RetryLoopEvent {
    /// The unit of work is about to be invoked.
    Iteration {
        pattern_name: String,
        timestamp: Instant,
        iteration: usize,
    },
    /// The work called `stop()` and the loop returned normally.
    Completed {
        pattern_name: String,
        timestamp: Instant,
        iterations: usize,
        duration: Duration,
    },
    /// The work returned an error, ending the loop.
    WorkFailed {
        pattern_name: String,
        timestamp: Instant,
        iterations: usize,
        duration: Duration,
    },
    /// The deadline passed before the work stopped the loop.
    TimedOut {
        pattern_name: String,
        timestamp: Instant,
        iterations: usize,
        timeout: Timeout,
        duration: Duration,
    },
}

impl RetryLoopEvent {
    /// Returns the kind of event.
    pub fn event_type(&self) -> &'static str {
        match self {
            RetryLoopEvent::Iteration { .. } => "Iteration",
            RetryLoopEvent::Completed { .. } => "Completed",
            RetryLoopEvent::WorkFailed { .. } => "WorkFailed",
            RetryLoopEvent::TimedOut { .. } => "TimedOut",
        }
    }

    /// Returns when this event occurred.
    pub fn timestamp(&self) -> Instant {
        match self {
            RetryLoopEvent::Iteration { timestamp, .. }
            | RetryLoopEvent::Completed { timestamp, .. }
            | RetryLoopEvent::WorkFailed { timestamp, .. }
            | RetryLoopEvent::TimedOut { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the name of the loop that emitted this event.
    pub fn pattern_name(&self) -> &str {
        match self {
            RetryLoopEvent::Iteration { pattern_name, .. }
            | RetryLoopEvent::Completed { pattern_name, .. }
            | RetryLoopEvent::WorkFailed { pattern_name, .. }
            | RetryLoopEvent::TimedOut { pattern_name, .. } => pattern_name,
        }
    }
}

/// Receives [`RetryLoopEvent`]s.
pub trait EventListener: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &RetryLoopEvent);
}

/// A listener backed by a closure.
pub struct FnListener<F> {
    f: F,
}

impl<F> FnListener<F>
where
    F: Fn(&RetryLoopEvent) + Send + Sync,
{
    /// Wraps a closure as a listener.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&RetryLoopEvent) + Send + Sync,
{
    fn on_event(&self, event: &RetryLoopEvent) {
        (self.f)(event)
    }
}

/// The listeners registered on one loop.
#[derive(Clone, Default)]
pub struct EventListeners {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// A panicking listener is skipped; the others still run and the loop
    /// itself is unaffected.
    pub fn emit(&self, event: &RetryLoopEvent) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Returns true if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}
