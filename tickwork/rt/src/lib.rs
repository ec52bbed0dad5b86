#![no_std]
#![forbid(unsafe_code)]

//! # Cooperative main loop
//!
//! Work deferred from interrupts runs to completion, one item after another,
//! from [`MainLoop`]. Nothing preempts a running item except interrupts.
//! When a pass finds the queue empty the loop calls its idle hook, which by
//! default sleeps until the next interrupt on ARM targets.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use tickwork_queue::{tw_debug, tw_trace, Drain};

/// Counters describing main loop activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Calls to [`MainLoop::poll`]
    pub passes: u32,
    /// Passes that found nothing to run
    pub idle_passes: u32,
    /// Work items executed
    pub executed: u32,
}

impl fmt::Display for LoopStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "passes={} idle={} executed={}",
            self.passes, self.idle_passes, self.executed
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LoopStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "passes={} idle={} executed={}",
            self.passes,
            self.idle_passes,
            self.executed
        );
    }
}

/// Idle hook used unless another one is given
///
/// Waits for an interrupt on ARM, spins elsewhere.
pub fn default_idle() {
    #[cfg(target_arch = "arm")]
    cortex_m::asm::wfi();

    #[cfg(not(target_arch = "arm"))]
    core::hint::spin_loop();
}

/// Cooperative loop draining a deferred work queue
pub struct MainLoop<'q, Q> {
    queue: &'q Q,
    idle: fn(),
    stats: Mutex<RefCell<LoopStats>>,
}

impl<'q, Q: Drain> MainLoop<'q, Q> {
    /// Create a loop over `queue` with the default idle hook
    pub const fn new(queue: &'q Q) -> Self {
        Self::with_idle(queue, default_idle)
    }

    /// Create a loop calling `idle` whenever a pass runs nothing
    pub const fn with_idle(queue: &'q Q, idle: fn()) -> Self {
        Self {
            queue,
            idle,
            stats: Mutex::new(RefCell::new(LoopStats {
                passes: 0,
                idle_passes: 0,
                executed: 0,
            })),
        }
    }

    /// Run one pass: drain the queue once, idle if nothing ran.
    ///
    /// Returns the number of items executed.
    pub fn poll(&self) -> usize {
        let executed = self.queue.drain();
        critical_section::with(|cs| {
            let mut stats = self.stats.borrow_ref_mut(cs);
            stats.passes = stats.passes.wrapping_add(1);
            stats.executed = stats.executed.wrapping_add(executed as u32);
            if executed == 0 {
                stats.idle_passes = stats.idle_passes.wrapping_add(1);
            }
        });

        if executed == 0 {
            (self.idle)();
        } else {
            tw_trace!("main loop ran {} items", executed);
        }
        executed
    }

    /// Drain until the queue stays empty, without idling.
    ///
    /// Work that keeps resubmitting itself makes this loop forever.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        while !self.queue.is_idle() {
            total += self.queue.drain();
        }
        critical_section::with(|cs| {
            let mut stats = self.stats.borrow_ref_mut(cs);
            stats.executed = stats.executed.wrapping_add(total as u32);
        });
        total
    }

    /// Poll forever
    pub fn run(&self) -> ! {
        tw_debug!("main loop started");
        loop {
            self.poll();
        }
    }

    /// Activity counters since creation
    pub fn stats(&self) -> LoopStats {
        critical_section::with(|cs| *self.stats.borrow_ref(cs))
    }
}
