//! Time types

use core::fmt;

/// Microseconds per millisecond
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Microseconds per second
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Wide microsecond timestamp produced by the extended clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Zero timestamp
    pub const ZERO: Self = Self(0);

    /// Maximum timestamp value
    pub const MAX: Self = Self(u64::MAX);

    /// Create a timestamp from microseconds
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create a timestamp from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(MICROS_PER_MILLI))
    }

    /// Raw microsecond count
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Whole milliseconds
    pub const fn as_millis(self) -> u64 {
        self.0 / MICROS_PER_MILLI
    }

    /// Whole seconds
    pub const fn as_secs(self) -> u64 {
        self.0 / MICROS_PER_SEC
    }

    /// Timestamp `micros` later, saturating at [`Timestamp::MAX`]
    pub const fn saturating_add_micros(self, micros: u64) -> Self {
        Self(self.0.saturating_add(micros))
    }

    /// Microseconds elapsed since `earlier`, zero if `earlier` is later
    pub const fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Whether this timestamp has reached `deadline`
    pub const fn has_reached(self, deadline: Timestamp) -> bool {
        self.0 >= deadline.0
    }
}

impl From<u64> for Timestamp {
    fn from(micros: u64) -> Self {
        Self(micros)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Timestamp {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}us", self.0);
    }
}

/// Scheduler tick index, always below the configured rollover
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Tick(pub u32);

impl Tick {
    /// Advance by `step` ticks, wrapping at `rollover`.
    ///
    /// Returns the new tick and whether the addition wrapped.
    pub const fn advance(self, step: u32, rollover: u32) -> (Tick, bool) {
        let next = self.0 as u64 + step as u64;
        if next >= rollover as u64 {
            (Tick((next - rollover as u64) as u32), true)
        } else {
            (Tick(next as u32), false)
        }
    }

    /// Raw tick value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{}", self.0);
    }
}
