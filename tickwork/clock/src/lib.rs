#![no_std]
#![forbid(unsafe_code)]

//! # Extended Clock
//!
//! Hardware timers on small microcontrollers count in 16 or 32 bits and wrap
//! quickly. [`ExtendedClock`] counts the wraps in software and combines them
//! with the live register into a 64-bit microsecond [`Timestamp`]. It also
//! offers busy-wait delays and deadline callbacks that are handed to the
//! deferred work queue when they come due.
//!
//! Integration: route the timer's update interrupt to
//! [`ExtendedClock::on_rollover`].

pub mod clock;
pub mod config;

pub use clock::*;
pub use config::*;
pub use tickwork_core::{Action, Timestamp, TwError, TwResult};
