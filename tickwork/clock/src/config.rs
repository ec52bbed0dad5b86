//! Clock configuration

use core::fmt;

/// Default rollover period of the hardware counter, in microseconds
pub const DEFAULT_PRECISION_US: u32 = 50_000;

/// Configuration of the extended clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// Microseconds counted by the hardware register before it wraps
    pub precision_us: u32,
}

impl ClockConfig {
    /// Creates a configuration with the given rollover period.
    pub const fn new(precision_us: u32) -> Self {
        Self { precision_us }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> ClockConfigBuilder {
        ClockConfigBuilder::default()
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION_US)
    }
}

impl fmt::Display for ClockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "precision={}us", self.precision_us)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "precision={}us", self.precision_us);
    }
}

/// Builder for [`ClockConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClockConfigBuilder {
    config: ClockConfig,
}

impl ClockConfigBuilder {
    /// Sets the hardware rollover period in microseconds.
    pub fn precision_us(mut self, precision_us: u32) -> Self {
        self.config.precision_us = precision_us;
        self
    }

    /// Sets the hardware rollover period in milliseconds.
    pub fn precision_ms(mut self, precision_ms: u32) -> Self {
        self.config.precision_us = precision_ms.saturating_mul(1_000);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ClockConfig {
        self.config
    }
}
