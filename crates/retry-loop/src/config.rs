//! Configuration for a retry loop.

use crate::error::InvalidConfiguration;
use crate::events::{EventListener, EventListeners, FnListener, RetryLoopEvent};
use crate::timeout::Timeout;
use crate::RetryLoop;
use std::time::Duration;

/// Validated settings shared by every execution of a [`RetryLoop`].
#[derive(Debug)]
pub(crate) struct RetryLoopConfig {
    pub(crate) timeout: Timeout,
    pub(crate) pause: Duration,
    pub(crate) event_listeners: EventListeners,
    pub(crate) name: String,
}

/// Builder for configuring and constructing a [`RetryLoop`].
pub struct RetryLoopConfigBuilder {
    timeout: Timeout,
    pause: Duration,
    event_listeners: EventListeners,
    name: String,
}

impl RetryLoopConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            timeout: Timeout::Infinite,
            pause: Duration::ZERO,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the timeout of each execution.
    ///
    /// Default: [`Timeout::Infinite`]
    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Sets a finite timeout.
    pub fn timeout_duration(self, duration: Duration) -> Self {
        self.timeout(Timeout::After(duration))
    }

    /// Sets how long to wait between an invocation that did not stop the
    /// loop and the next one.
    ///
    /// With the default of zero the loop yields to the scheduler once
    /// between invocations.
    pub fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the name of this loop for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked before each invocation of the work,
    /// with the 1-based iteration number.
    pub fn on_iteration<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryLoopEvent::Iteration { iteration, .. } = event {
                f(*iteration);
            }
        }));
        self
    }

    /// Registers a callback invoked when the work stops the loop.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryLoopEvent::Completed {
                iterations,
                duration,
                ..
            } = event
            {
                f(*iterations, *duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when the work returns an error.
    pub fn on_work_error<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryLoopEvent::WorkFailed { iterations, .. } = event {
                f(*iterations);
            }
        }));
        self
    }

    /// Registers a callback invoked when an execution times out.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Timeout) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryLoopEvent::TimedOut { timeout, .. } = event {
                f(*timeout);
            }
        }));
        self
    }

    /// Registers a listener that receives every [`RetryLoopEvent`].
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Validates the configuration and builds the loop.
    pub fn build(self) -> Result<RetryLoop, InvalidConfiguration> {
        self.timeout.validate()?;
        Ok(RetryLoop::from_config(self.into_config()))
    }

    /// Converts the builder into a config without validating it.
    pub(crate) fn into_config(self) -> RetryLoopConfig {
        RetryLoopConfig {
            timeout: self.timeout,
            pause: self.pause,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for RetryLoopConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
