#![no_std]
#![forbid(unsafe_code)]

//! # Deferred Work Queue
//!
//! Interrupt handlers cannot run long work inline. They hand it to a
//! [`DeferredQueue`] instead, and the application main loop executes it later
//! by calling [`DeferredQueue::drain`]. The queue is a fixed array: when it is
//! full, new work is refused and reported, never overwritten.

pub mod queue;

pub use queue::*;
pub use tickwork_core::*;

/// Destination for work submitted from interrupt context.
///
/// The clock and the scheduler depend on this trait rather than on a concrete
/// queue, so they can be tested against any sink.
pub trait WorkSink {
    /// Submit an item for later execution
    fn submit(&self, item: WorkItem) -> TwResult<()>;
}

impl<S: WorkSink + ?Sized> WorkSink for &S {
    fn submit(&self, item: WorkItem) -> TwResult<()> {
        (**self).submit(item)
    }
}

/// Consumer side of a deferred work queue
pub trait Drain {
    /// Execute everything pending at the time of the call, returning how many
    /// items ran
    fn drain(&self) -> usize;

    /// Whether nothing is waiting to run
    fn is_idle(&self) -> bool;
}
