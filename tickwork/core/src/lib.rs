#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # tickwork core
//!
//! Types and traits shared by the tickwork components: the deferred work
//! queue, the extended microsecond clock and the periodic task scheduler.
//! Nothing in here allocates; every table in the framework is a fixed array
//! sized at compile time.

use core::fmt;

#[macro_use]
mod fmt_macros;

pub mod action;
pub mod hw;
pub mod stats;
pub mod time;

pub use action::*;
pub use hw::*;
pub use stats::*;
pub use time::*;

#[doc(hidden)]
#[cfg(all(feature = "log", not(feature = "defmt")))]
pub use log as __log;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default depth of the deferred work queue
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Default number of scheduler task slots
pub const DEFAULT_MAX_TASKS: usize = 32;

/// Default number of delayed-callback slots in the extended clock
pub const DEFAULT_MAX_CALLBACKS: usize = 32;

/// Result type used throughout tickwork
pub type TwResult<T> = Result<T, TwError>;

/// Error types for tickwork operations
///
/// All failures are reported through return values. None of them leaves a
/// component in a partially updated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwError {
    /// Deferred work queue is full, the item was dropped
    QueueFull,
    /// Every scheduler task slot is occupied
    TaskTableFull,
    /// Every delayed-callback slot is occupied
    CallbackTableFull,
    /// Parameter out of range (zero frequency, interval past rollover, ...)
    InvalidParameter,
    /// Task index out of range or pointing at an empty slot
    InvalidTask,
    /// Component has not been initialized
    NotInitialized,
    /// Backing timer could not be configured
    Timer,
}

impl TwError {
    /// Whether the error reports exhaustion of a fixed-capacity table
    pub const fn is_capacity(&self) -> bool {
        matches!(
            self,
            TwError::QueueFull | TwError::TaskTableFull | TwError::CallbackTableFull
        )
    }
}

impl fmt::Display for TwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwError::QueueFull => write!(f, "Deferred work queue is full"),
            TwError::TaskTableFull => write!(f, "Task table is full"),
            TwError::CallbackTableFull => write!(f, "Delayed callback table is full"),
            TwError::InvalidParameter => write!(f, "Invalid parameter"),
            TwError::InvalidTask => write!(f, "Invalid task index"),
            TwError::NotInitialized => write!(f, "Component not initialized"),
            TwError::Timer => write!(f, "Timer configuration failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TwError {}

#[cfg(feature = "defmt")]
impl defmt::Format for TwError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TwError::QueueFull => defmt::write!(fmt, "QueueFull"),
            TwError::TaskTableFull => defmt::write!(fmt, "TaskTableFull"),
            TwError::CallbackTableFull => defmt::write!(fmt, "CallbackTableFull"),
            TwError::InvalidParameter => defmt::write!(fmt, "InvalidParameter"),
            TwError::InvalidTask => defmt::write!(fmt, "InvalidTask"),
            TwError::NotInitialized => defmt::write!(fmt, "NotInitialized"),
            TwError::Timer => defmt::write!(fmt, "Timer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_are_classified() {
        assert!(TwError::QueueFull.is_capacity());
        assert!(TwError::TaskTableFull.is_capacity());
        assert!(TwError::CallbackTableFull.is_capacity());
        assert!(!TwError::InvalidTask.is_capacity());
        assert!(!TwError::Timer.is_capacity());
    }
}
