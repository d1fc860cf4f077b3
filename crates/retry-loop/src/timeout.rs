//! Timeout configuration for a retry loop.

use crate::error::InvalidConfiguration;
use std::fmt;
use std::time::Duration;

/// Upper bound on the wall-clock time of one [`execute`](crate::RetryLoop::execute) call.
///
/// "No timeout" is its own variant. A zero duration is never used as a
/// sentinel; it is rejected when the loop is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// The loop runs until the work stops it or fails.
    #[default]
    Infinite,
    /// The loop aborts once this much time has passed since `execute` began.
    After(Duration),
}

impl Timeout {
    /// A timeout of whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Timeout::After(Duration::from_secs(secs))
    }

    /// A timeout of whole milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Timeout::After(Duration::from_millis(millis))
    }

    /// Parses a timeout from fractional seconds.
    ///
    /// Positive infinity maps to [`Timeout::Infinite`]. Zero, negative
    /// values and NaN are rejected.
    ///
    /// ```
    /// use retry_loop::{InvalidConfiguration, Timeout};
    /// use std::time::Duration;
    ///
    /// assert_eq!(Timeout::from_secs_f64(1.5), Ok(Timeout::After(Duration::from_millis(1500))));
    /// assert_eq!(Timeout::from_secs_f64(f64::INFINITY), Ok(Timeout::Infinite));
    /// assert_eq!(Timeout::from_secs_f64(0.0), Err(InvalidConfiguration::ZeroTimeout));
    /// ```
    pub fn from_secs_f64(secs: f64) -> Result<Self, InvalidConfiguration> {
        if secs.is_nan() {
            return Err(InvalidConfiguration::NotANumber);
        }
        if secs == 0.0 {
            return Err(InvalidConfiguration::ZeroTimeout);
        }
        if secs < 0.0 {
            return Err(InvalidConfiguration::NegativeTimeout { seconds: secs });
        }
        if secs == f64::INFINITY {
            return Ok(Timeout::Infinite);
        }
        // Values beyond Duration::MAX are unbounded for every practical purpose.
        match Duration::try_from_secs_f64(secs) {
            Ok(duration) => Timeout::After(duration).validate(),
            Err(_) => Ok(Timeout::Infinite),
        }
    }

    /// Returns the bounded duration, or `None` for [`Timeout::Infinite`].
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Timeout::Infinite => None,
            Timeout::After(duration) => Some(*duration),
        }
    }

    /// Returns true if no time bound is enforced.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Timeout::Infinite)
    }

    pub(crate) fn validate(self) -> Result<Self, InvalidConfiguration> {
        match self {
            Timeout::After(duration) if duration.is_zero() => Err(InvalidConfiguration::ZeroTimeout),
            other => Ok(other),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::After(duration)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Timeout::Infinite, Timeout::After)
    }
}

/// Renders the timeout in seconds: `1` for whole seconds, `0.25` otherwise.
impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::Infinite => write!(f, "infinite"),
            Timeout::After(duration) => {
                write!(f, "{}", duration.as_secs())?;
                let nanos = duration.subsec_nanos();
                if nanos == 0 {
                    return Ok(());
                }
                let fraction = format!("{nanos:09}");
                write!(f, ".{}", fraction.trim_end_matches('0'))
            }
        }
    }
}
