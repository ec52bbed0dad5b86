#![no_std]
#![forbid(unsafe_code)]

//! # Periodic Task Scheduler
//!
//! A fixed table of periodic and one-shot tasks driven by a dedicated
//! hardware tick. The tick interrupt calls [`Scheduler::update`], which hands
//! every due task to the deferred work queue; task bodies then run from the
//! main loop.
//!
//! ```ignore
//! static QUEUE: DeferredQueue = DeferredQueue::new();
//! static SCHED: Scheduler<Tim2, DeferredQueue> =
//!     Scheduler::new(Tim2, &QUEUE, SchedulerConfig::new(1_000));
//!
//! SCHED.init()?;
//! SCHED.add_task(TaskConfig::new(Action::from_fn(blink)).interval(500))?;
//! ```

pub mod config;
pub mod scheduler;
pub mod task;

pub use config::*;
pub use scheduler::*;
pub use task::*;
pub use tickwork_core::{Action, Tick, TwError, TwResult};
