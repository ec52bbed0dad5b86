//! Host port of tickwork.
//!
//! Provides what a board support package provides on target:
//!
//! - a `critical-section` implementation (the crate's `std` backend),
//! - [`SimTimer`], a software timer peripheral implementing
//!   [`HardwareTimer`](tickwork_core::HardwareTimer),
//! - [`Ticker`], a thread standing in for a periodic interrupt vector.

pub mod ticker;
pub mod timer;

pub use ticker::{period_for, Ticker, MAX_RATE_HZ};
pub use timer::{SimTimer, DEFAULT_INPUT_HZ};
