//! Bounded retry loop with a preemptive timeout.
//!
//! A [`RetryLoop`] invokes a unit of work over and over until the work
//! calls [`LoopControl::stop`], the work returns an error, or the
//! configured [`Timeout`] elapses. The timeout is enforced even while the
//! work is suspended: the in-flight invocation is abandoned at the deadline
//! and [`LoopError::TimeoutExceeded`] is returned.
//!
//! Features:
//! - Finite or infinite timeout, validated at construction
//! - Call-scoped stop signal, safe for overlapping executions
//! - Work errors propagated as-is, never retried
//! - Synchronous work on the blocking pool via [`RetryLoop::execute_blocking`]
//! - Event system for observability (on_iteration, on_complete, on_timeout)
//! - Optional metrics, tracing and a Tower adapter (`layer` feature)
//!
//! ## Basic Example
//!
//! ```rust
//! use retry_loop::{RetryLoop, Timeout};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retry_loop = RetryLoop::new(Timeout::from_secs(5))?;
//! let attempts = AtomicUsize::new(0);
//!
//! retry_loop
//!     .execute(|control| {
//!         let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
//!         async move {
//!             if attempt == 3 {
//!                 control.stop();
//!             }
//!             Ok::<_, std::io::Error>(())
//!         }
//!     })
//!     .await?;
//!
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Preemption
//!
//! The deadline is a Tokio timer raced against the future returned by the
//! work. When it fires the future is dropped, which cancels whatever the
//! work was awaiting (a sleep, a socket read, a lock). Work that blocks the
//! executor thread without awaiting cannot be cancelled this way; run such
//! work through [`RetryLoop::execute_blocking`] instead.
//!
//! ```rust
//! use retry_loop::{LoopError, RetryLoop};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let retry_loop = RetryLoop::builder()
//!     .timeout_duration(Duration::from_millis(50))
//!     .name("slow-work")
//!     .build()
//!     .unwrap();
//!
//! let result = retry_loop
//!     .execute(|_control| async {
//!         tokio::time::sleep(Duration::from_secs(10)).await;
//!         Ok::<_, std::io::Error>(())
//!     })
//!     .await;
//!
//! assert!(matches!(result, Err(LoopError::TimeoutExceeded { .. })));
//! # }
//! ```

use std::future::Future;
use std::panic;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{self, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

pub use config::RetryLoopConfigBuilder;
pub use control::LoopControl;
pub use error::{InvalidConfiguration, LoopError};
pub use events::{EventListener, EventListeners, FnListener, RetryLoopEvent};
#[cfg(feature = "layer")]
pub use layer::{PollUntil, RetryLoopLayer};
pub use timeout::Timeout;

mod config;
mod control;
mod error;
mod events;
#[cfg(feature = "layer")]
mod layer;
mod preempt;
mod timeout;

use config::RetryLoopConfig;
use preempt::Preempt;

/// Repeats a unit of work until it signals completion, fails, or times out.
///
/// A `RetryLoop` holds only configuration. It can be cloned and shared, and
/// every [`execute`](Self::execute) call keeps its own state.
#[derive(Debug, Clone)]
pub struct RetryLoop {
    config: Arc<RetryLoopConfig>,
}

impl RetryLoop {
    /// Creates a loop with the given timeout and default settings.
    ///
    /// Fails with [`InvalidConfiguration::ZeroTimeout`] for a zero finite timeout.
    pub fn new(timeout: impl Into<Timeout>) -> Result<Self, InvalidConfiguration> {
        Self::builder().timeout(timeout).build()
    }

    /// Creates a loop without a time bound.
    pub fn unbounded() -> Self {
        Self::from_config(RetryLoopConfigBuilder::new().into_config())
    }

    /// Creates a new builder for configuring a loop.
    pub fn builder() -> RetryLoopConfigBuilder {
        RetryLoopConfigBuilder::new()
    }

    pub(crate) fn from_config(config: RetryLoopConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "retry_loop_executions_total",
                "Total number of retry loop executions (completed, work_failed, or timed_out)"
            );
            describe_histogram!(
                "retry_loop_iterations",
                "Number of work invocations per execution"
            );
            describe_histogram!(
                "retry_loop_execution_duration_seconds",
                "Duration of retry loop executions"
            );
        }

        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Timeout {
        self.config.timeout
    }

    /// Returns the name of this loop.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Runs `work` until it calls [`LoopControl::stop`], returns an error,
    /// or the timeout elapses.
    ///
    /// `work` receives a [`LoopControl`] for this execution. Invocations
    /// never overlap: the next one starts only after the previous future
    /// resolved with `Ok(())` and did not stop the loop.
    ///
    /// # Errors
    ///
    /// - [`LoopError::Work`] with the work's error, unchanged, as soon as an
    ///   invocation fails.
    /// - [`LoopError::TimeoutExceeded`] once the deadline passes, even if the
    ///   invocation in flight is suspended or has just called `stop()`.
    pub async fn execute<W, Fut, E>(&self, work: W) -> Result<(), LoopError<E>>
    where
        W: FnMut(LoopControl) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.drive(work).await
    }

    /// Like [`execute`](Self::execute) for synchronous work.
    ///
    /// Each invocation runs on Tokio's blocking thread pool while the caller
    /// waits for it under the same deadline. A thread cannot be interrupted,
    /// so on timeout the running invocation is abandoned: this method
    /// returns [`LoopError::TimeoutExceeded`] at the deadline and starts no
    /// further invocation, while the stray one finishes in the background
    /// and its result is discarded.
    ///
    /// A panic inside `work` is resumed on the caller.
    pub async fn execute_blocking<W, E>(&self, work: W) -> Result<(), LoopError<E>>
    where
        W: FnMut(&LoopControl) -> Result<(), E> + Send + 'static,
        E: Send + 'static,
    {
        let work = Arc::new(Mutex::new(work));
        self.drive(move |control| {
            let work = Arc::clone(&work);
            async move {
                let handle = tokio::task::spawn_blocking(move || {
                    let mut work = work.lock().unwrap_or_else(PoisonError::into_inner);
                    (*work)(&control)
                });
                match handle.await {
                    Ok(result) => result,
                    Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
                    // Blocking tasks are only cancelled by a runtime shutdown,
                    // which drops this task as well.
                    Err(_) => std::future::pending().await,
                }
            }
        })
        .await
    }

    async fn drive<W, Fut, E>(&self, mut work: W) -> Result<(), LoopError<E>>
    where
        W: FnMut(LoopControl) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let control = LoopControl::new();
        let start = Instant::now();
        // An unrepresentable deadline is as good as none.
        let deadline = self
            .config
            .timeout
            .duration()
            .and_then(|timeout| start.checked_add(timeout));
        let mut timer = deadline.map(|deadline| Box::pin(time::sleep_until(deadline)));
        let expired = || deadline.is_some_and(|deadline| Instant::now() >= deadline);

        loop {
            if expired() {
                return Err(self.timed_out(&control, start));
            }

            let iteration = control.begin_iteration();
            self.config
                .event_listeners
                .emit(&RetryLoopEvent::Iteration {
                    pattern_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    iteration,
                });

            #[cfg(feature = "tracing")]
            trace!(retry_loop = %self.config.name, iteration, "Invoking work");

            let invocation = work(control.clone());
            let deadline_timer = timer.as_mut().map(|timer| timer.as_mut());
            let outcome = Preempt::new(deadline_timer, invocation).await;

            let result = match outcome {
                Some(result) if !expired() => result,
                _ => return Err(self.timed_out(&control, start)),
            };

            if let Err(err) = result {
                self.work_failed(&control, start);
                return Err(LoopError::Work(err));
            }

            if control.is_stopped() {
                self.completed(&control, start);
                return Ok(());
            }

            if self.config.pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                let pause = time::sleep(self.config.pause);
                // An interrupted pause is reported by the expiry check above.
                let deadline_timer = timer.as_mut().map(|timer| timer.as_mut());
                let _ = Preempt::new(deadline_timer, pause).await;
            }
        }
    }

    fn completed(&self, control: &LoopControl, start: Instant) {
        let iterations = control.iteration();
        let duration = start.elapsed();
        self.config.event_listeners.emit(&RetryLoopEvent::Completed {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            iterations,
            duration,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("retry_loop_executions_total", "retry_loop" => self.config.name.clone(), "result" => "completed").increment(1);
            histogram!("retry_loop_iterations", "retry_loop" => self.config.name.clone())
                .record(iterations as f64);
            histogram!("retry_loop_execution_duration_seconds", "retry_loop" => self.config.name.clone())
                .record(duration.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        debug!(
            retry_loop = %self.config.name,
            iterations,
            duration_ms = duration.as_millis(),
            "Work stopped the loop"
        );
    }

    fn work_failed(&self, control: &LoopControl, start: Instant) {
        let iterations = control.iteration();
        let duration = start.elapsed();
        self.config.event_listeners.emit(&RetryLoopEvent::WorkFailed {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            iterations,
            duration,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("retry_loop_executions_total", "retry_loop" => self.config.name.clone(), "result" => "work_failed").increment(1);
            histogram!("retry_loop_iterations", "retry_loop" => self.config.name.clone())
                .record(iterations as f64);
            histogram!("retry_loop_execution_duration_seconds", "retry_loop" => self.config.name.clone())
                .record(duration.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        debug!(
            retry_loop = %self.config.name,
            iterations,
            duration_ms = duration.as_millis(),
            "Work failed, loop aborted"
        );
    }

    fn timed_out<E>(&self, control: &LoopControl, start: Instant) -> LoopError<E> {
        let timeout = self.config.timeout;
        let iterations = control.iteration();
        let duration = start.elapsed();
        self.config.event_listeners.emit(&RetryLoopEvent::TimedOut {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            iterations,
            timeout,
            duration,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("retry_loop_executions_total", "retry_loop" => self.config.name.clone(), "result" => "timed_out").increment(1);
            histogram!("retry_loop_iterations", "retry_loop" => self.config.name.clone())
                .record(iterations as f64);
            histogram!("retry_loop_execution_duration_seconds", "retry_loop" => self.config.name.clone())
                .record(duration.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        warn!(
            retry_loop = %self.config.name,
            iterations,
            timeout = %timeout,
            duration_ms = duration.as_millis(),
            "Retry loop timed out"
        );

        LoopError::TimeoutExceeded { timeout }
    }
}
