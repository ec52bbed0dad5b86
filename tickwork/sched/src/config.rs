//! Scheduler configuration

use core::fmt;

/// Tick rate used when none is given, in hertz
pub const DEFAULT_TICK_HZ: u32 = 1_000;

/// Tick counter modulus used when none is given
pub const DEFAULT_ROLLOVER: u32 = u32::MAX;

/// Configuration of the task scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Tick interrupt rate in hertz
    pub tick_hz: u32,
    /// The tick counter wraps to zero on reaching this value
    pub rollover: u32,
}

impl SchedulerConfig {
    /// Creates a configuration ticking at `tick_hz` with the default rollover.
    pub const fn new(tick_hz: u32) -> Self {
        Self {
            tick_hz,
            rollover: DEFAULT_ROLLOVER,
        }
    }

    /// Sets the tick counter modulus.
    pub const fn with_rollover(mut self, rollover: u32) -> Self {
        self.rollover = rollover;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_HZ)
    }
}

impl fmt::Display for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz rollover={}", self.tick_hz, self.rollover)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SchedulerConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}Hz rollover={}", self.tick_hz, self.rollover);
    }
}
