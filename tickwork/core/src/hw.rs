//! Hardware timer contract
//!
//! The clock and the scheduler only need four things from a timer peripheral:
//! set its rate, read its live counter, get one interrupt per rollover, and
//! switch it on or off. Register layout stays on the HAL side of this trait.

use core::fmt;

use crate::{TwError, TwResult};

/// Largest prescaler a 16-bit prescaler register can express (`PSC + 1`)
pub const MAX_PRESCALER: u32 = 0x1_0000;

/// Prescaler and auto-reload values for a timer peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Input clock divider; the register value is `prescaler - 1`
    pub prescaler: u32,
    /// Auto-reload register value; the counter wraps after `reload + 1` counts
    pub reload: u32,
}

impl TimerConfig {
    /// Compute a configuration that counts `precision` steps per period and
    /// completes `rate_hz` periods per second from an `input_hz` clock.
    ///
    /// With `precision = 1` every count is one update event. The extended
    /// clock uses `rate_hz * precision = 1 MHz`.
    pub fn for_rate(input_hz: u32, rate_hz: u32, precision: u32) -> TwResult<Self> {
        if rate_hz == 0 || precision == 0 {
            return Err(TwError::InvalidParameter);
        }

        let divisor = rate_hz as u64 * precision as u64;
        let prescaler = input_hz as u64 / divisor;
        if prescaler == 0 || prescaler > MAX_PRESCALER as u64 {
            return Err(TwError::Timer);
        }

        Ok(Self {
            prescaler: prescaler as u32,
            reload: precision - 1,
        })
    }

    /// Compute a configuration raising `rate_hz` update events per second,
    /// using the shortest period the prescaler range allows.
    pub fn for_tick(input_hz: u32, rate_hz: u32) -> TwResult<Self> {
        if rate_hz == 0 {
            return Err(TwError::InvalidParameter);
        }
        let per_count = rate_hz as u64 * MAX_PRESCALER as u64;
        let precision = (input_hz as u64).div_ceil(per_count).max(1);
        Self::for_rate(input_hz, rate_hz, precision as u32)
    }

    /// Compute a configuration for a free-running 1 MHz counter that wraps
    /// every `period_us` microseconds.
    pub fn microsecond_counter(input_hz: u32, period_us: u32) -> TwResult<Self> {
        if period_us == 0 {
            return Err(TwError::InvalidParameter);
        }
        let prescaler = input_hz / 1_000_000;
        if prescaler == 0 || prescaler > MAX_PRESCALER {
            return Err(TwError::Timer);
        }
        Ok(Self {
            prescaler,
            reload: period_us - 1,
        })
    }

    /// Counts per period
    pub const fn period_counts(&self) -> u64 {
        self.reload as u64 + 1
    }
}

impl fmt::Display for TimerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "psc={} arr={}", self.prescaler, self.reload)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimerConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "psc={} arr={}", self.prescaler, self.reload);
    }
}

/// Timer peripheral driving the clock or the scheduler.
///
/// Methods take `&self`: the component holding the timer is shared between
/// its interrupt handler and normal context, so implementations use interior
/// mutability (memory-mapped registers, atomics).
pub trait HardwareTimer {
    /// Frequency of the clock feeding the timer, in hertz
    fn input_frequency(&self) -> u32;

    /// Program prescaler and auto-reload
    fn configure(&self, config: TimerConfig) -> TwResult<()>;

    /// Live counter register
    fn counter(&self) -> u32;

    /// Overwrite the counter register
    fn set_counter(&self, value: u32);

    /// Start counting with the update (rollover) interrupt enabled
    fn enable(&self);

    /// Stop counting and mask the update interrupt
    fn disable(&self);

    /// Whether an update event has been latched but not yet serviced
    fn update_pending(&self) -> bool {
        false
    }

    /// Clear the latched update flag.
    ///
    /// Called by the component servicing the rollover, in the same critical
    /// section that accounts for the elapsed period. Interrupt handlers must
    /// leave the flag alone and let the component clear it.
    fn clear_update(&self) {}
}

impl<T: HardwareTimer + ?Sized> HardwareTimer for &T {
    fn input_frequency(&self) -> u32 {
        (**self).input_frequency()
    }

    fn configure(&self, config: TimerConfig) -> TwResult<()> {
        (**self).configure(config)
    }

    fn counter(&self) -> u32 {
        (**self).counter()
    }

    fn set_counter(&self, value: u32) {
        (**self).set_counter(value)
    }

    fn enable(&self) {
        (**self).enable()
    }

    fn disable(&self) {
        (**self).disable()
    }

    fn update_pending(&self) -> bool {
        (**self).update_pending()
    }

    fn clear_update(&self) {
        (**self).clear_update()
    }
}
