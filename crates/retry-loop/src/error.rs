//! Error types for the retry loop.

use crate::timeout::Timeout;

/// A retry loop could not be constructed from the given configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidConfiguration {
    /// A finite timeout of zero length was requested.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    /// A negative timeout was requested.
    #[error("timeout must be greater than zero, got {seconds} seconds")]
    NegativeTimeout {
        /// The rejected value.
        seconds: f64,
    },
    /// The timeout was not a number.
    #[error("timeout must be a number")]
    NotANumber,
}

/// Errors returned by [`RetryLoop::execute`](crate::RetryLoop::execute).
///
/// Errors raised by the unit of work are carried in [`LoopError::Work`]
/// untouched. Both `Display` and `source` are forwarded to them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoopError<E> {
    /// The deadline passed before the work signalled completion.
    #[error("Timeout of {timeout} seconds exceeded.")]
    TimeoutExceeded {
        /// The timeout the loop was configured with.
        timeout: Timeout,
    },
    /// The unit of work returned an error.
    #[error(transparent)]
    Work(E),
}

impl<E> LoopError<E> {
    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LoopError::TimeoutExceeded { .. })
    }

    /// Returns the configured timeout if this is a timeout error.
    pub fn timeout(&self) -> Option<Timeout> {
        match self {
            LoopError::TimeoutExceeded { timeout } => Some(*timeout),
            LoopError::Work(_) => None,
        }
    }

    /// Returns a reference to the work's error, if any.
    pub fn work(&self) -> Option<&E> {
        match self {
            LoopError::TimeoutExceeded { .. } => None,
            LoopError::Work(e) => Some(e),
        }
    }

    /// Converts this error into the work's error, if any.
    pub fn into_work(self) -> Option<E> {
        match self {
            LoopError::TimeoutExceeded { .. } => None,
            LoopError::Work(e) => Some(e),
        }
    }
}
