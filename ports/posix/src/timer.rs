//! Simulated timer peripheral
//!
//! Stands in for a hardware timer on the host. Time only moves when the test
//! or the ticker thread says so, which makes rollover handling reproducible.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tickwork_core::{HardwareTimer, TimerConfig, TwError, TwResult};

/// Timer input clock used when none is given, in hertz
pub const DEFAULT_INPUT_HZ: u32 = 72_000_000;

/// Atomic-backed [`HardwareTimer`]
#[derive(Debug)]
pub struct SimTimer {
    input_hz: u32,
    counter: AtomicU32,
    prescaler: AtomicU32,
    reload: AtomicU32,
    enabled: AtomicBool,
    pending: AtomicBool,
    auto_step: AtomicU32,
    configured: AtomicU32,
    refuse_configure: AtomicBool,
}

impl SimTimer {
    /// Creates a stopped timer fed by an `input_hz` clock.
    pub const fn new(input_hz: u32) -> Self {
        Self {
            input_hz,
            counter: AtomicU32::new(0),
            prescaler: AtomicU32::new(1),
            reload: AtomicU32::new(u32::MAX),
            enabled: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            auto_step: AtomicU32::new(0),
            configured: AtomicU32::new(0),
            refuse_configure: AtomicBool::new(false),
        }
    }

    /// Advances the counter by `step` on every counter read, so busy-wait
    /// loops make progress without a second thread.
    pub fn with_auto_step(self, step: u32) -> Self {
        self.auto_step.store(step, Ordering::SeqCst);
        self
    }

    /// Sets the per-read auto step.
    pub fn set_auto_step(&self, step: u32) {
        self.auto_step.store(step, Ordering::SeqCst);
    }

    /// Makes the next `configure` call fail, like a peripheral that rejects
    /// its settings.
    pub fn refuse_configure(&self, refuse: bool) {
        self.refuse_configure.store(refuse, Ordering::SeqCst);
    }

    /// Counts `counts` timer steps and returns how many times the counter
    /// wrapped. A wrap latches the update flag until
    /// [`HardwareTimer::clear_update`] is called.
    pub fn advance(&self, counts: u64) -> u64 {
        if !self.enabled.load(Ordering::SeqCst) {
            return 0;
        }
        let period = self.reload.load(Ordering::SeqCst) as u64 + 1;
        let total = self.counter.load(Ordering::SeqCst) as u64 + counts;
        let wraps = total / period;
        self.counter.store((total % period) as u32, Ordering::SeqCst);
        if wraps > 0 {
            self.pending.store(true, Ordering::SeqCst);
        }
        wraps
    }

    /// Whether the timer is counting
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Last programmed configuration
    pub fn config(&self) -> TimerConfig {
        TimerConfig {
            prescaler: self.prescaler.load(Ordering::SeqCst),
            reload: self.reload.load(Ordering::SeqCst),
        }
    }

    /// Number of successful `configure` calls
    pub fn configure_count(&self) -> u32 {
        self.configured.load(Ordering::SeqCst)
    }
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_HZ)
    }
}

impl HardwareTimer for SimTimer {
    fn input_frequency(&self) -> u32 {
        self.input_hz
    }

    fn configure(&self, config: TimerConfig) -> TwResult<()> {
        if self.refuse_configure.load(Ordering::SeqCst) {
            return Err(TwError::Timer);
        }
        self.prescaler.store(config.prescaler, Ordering::SeqCst);
        self.reload.store(config.reload, Ordering::SeqCst);
        self.configured.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn counter(&self) -> u32 {
        let value = self.counter.load(Ordering::SeqCst);
        let step = self.auto_step.load(Ordering::SeqCst);
        if step > 0 {
            self.advance(step as u64);
        }
        value
    }

    fn set_counter(&self, value: u32) {
        self.counter.store(value, Ordering::SeqCst);
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn update_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    fn clear_update(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}
