//! Error types
//!
//! Every fallible operation in the crate reports one of these variants to its
//! immediate caller. Nothing is retried and nothing is fatal by itself.

use core::fmt;

/// Result type for scheduler and kernel operations
pub type Result<T> = core::result::Result<T, Error>;

/// Scheduler-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No free registry node is left for a new task
    RegistryFull,
    /// Task period must be at least one tick
    ZeroPeriod,
    /// Handle does not refer to a live task
    UnknownTask,
    /// Dependency would make a task (transitively) wait on itself
    DependencyCycle,
    /// Deferred start/restart queue is full
    RequestQueueFull,
    /// Kernel scheduler is borrowed, e.g. by a running dispatch pass
    Busy,
    /// Periodic interrupt source refused the configuration
    Timer(TimerError),
}

/// Periodic interrupt source errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Requested period cannot be produced by the source
    PeriodOutOfRange,
    /// A handler is already attached; detach first
    AlreadyAttached,
    /// The source is not available (e.g. hardware fault, not initialized)
    Unavailable,
}

impl From<TimerError> for Error {
    fn from(err: TimerError) -> Self {
        Error::Timer(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RegistryFull => write!(f, "task registry is full"),
            Error::ZeroPeriod => write!(f, "task period must be at least one tick"),
            Error::UnknownTask => write!(f, "unknown task handle"),
            Error::DependencyCycle => write!(f, "dependency would create a cycle"),
            Error::RequestQueueFull => write!(f, "request queue is full"),
            Error::Busy => write!(f, "scheduler is busy"),
            Error::Timer(e) => write!(f, "tick source error: {}", e),
        }
    }
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::PeriodOutOfRange => write!(f, "period out of range"),
            TimerError::AlreadyAttached => write!(f, "handler already attached"),
            TimerError::Unavailable => write!(f, "tick source unavailable"),
        }
    }
}
