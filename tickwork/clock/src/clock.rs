//! Extended microsecond clock

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;
use tickwork_core::{
    tw_debug, tw_info, tw_warn, Action, HardwareTimer, SlotStats, TimerConfig, Timestamp,
    TwError, TwResult, WorkItem, DEFAULT_MAX_CALLBACKS, MICROS_PER_MILLI,
};
use tickwork_queue::WorkSink;

use crate::ClockConfig;

/// Work waiting for an absolute deadline
#[derive(Debug, Clone, Copy)]
struct DelayedCallback {
    deadline: Timestamp,
    item: WorkItem,
}

struct ClockState<const N: usize> {
    initialized: bool,
    /// Microseconds accumulated from completed hardware periods
    upper: u64,
    last_sync: u64,
    callbacks: [Option<DelayedCallback>; N],
    /// One past the highest occupied callback slot; bounds the rollover scan
    high_water: usize,
    stats: SlotStats,
}

impl<const N: usize> ClockState<N> {
    const fn new() -> Self {
        Self {
            initialized: false,
            upper: 0,
            last_sync: 0,
            callbacks: [None; N],
            high_water: 0,
            stats: SlotStats::new(N),
        }
    }

    fn insert(&mut self, callback: DelayedCallback) -> TwResult<usize> {
        match self.callbacks.iter().position(Option::is_none) {
            Some(index) => {
                self.callbacks[index] = Some(callback);
                self.high_water = self.high_water.max(index + 1);
                self.stats.on_acquire();
                Ok(index)
            }
            None => {
                self.stats.on_reject();
                Err(TwError::CallbackTableFull)
            }
        }
    }

    /// Remove every callback whose deadline has been reached, in slot order.
    fn take_due(&mut self, now: Timestamp) -> Vec<WorkItem, N> {
        let mut due = Vec::new();
        for slot in &mut self.callbacks[..self.high_water] {
            if let Some(callback) = *slot {
                if now.has_reached(callback.deadline) {
                    // At most N slots exist, so the push cannot fail.
                    let _ = due.push(callback.item);
                    *slot = None;
                    self.stats.on_release();
                }
            }
        }
        while self.high_water > 0 && self.callbacks[self.high_water - 1].is_none() {
            self.high_water -= 1;
        }
        due
    }

    fn clear_callbacks(&mut self) {
        self.callbacks = [None; N];
        self.high_water = 0;
        self.stats.on_clear();
    }
}

/// 64-bit microsecond clock extending a wrapping hardware counter.
///
/// The hardware timer counts at 1 MHz and wraps every `precision_us`
/// microseconds; each wrap raises an interrupt that must call
/// [`on_rollover`](Self::on_rollover). Due deadline callbacks are submitted to
/// the work sink `Q` and run later from the main loop, never in the
/// interrupt.
pub struct ExtendedClock<'q, T, Q, const N: usize = DEFAULT_MAX_CALLBACKS> {
    timer: T,
    queue: &'q Q,
    precision_us: u32,
    state: Mutex<RefCell<ClockState<N>>>,
}

impl<'q, T, Q, const N: usize> ExtendedClock<'q, T, Q, N>
where
    T: HardwareTimer,
    Q: WorkSink,
{
    /// Create an uninitialized clock
    pub const fn new(timer: T, queue: &'q Q, config: ClockConfig) -> Self {
        Self {
            timer,
            queue,
            precision_us: config.precision_us,
            state: Mutex::new(RefCell::new(ClockState::new())),
        }
    }

    /// Configure the timer for 1 µs resolution and start counting.
    ///
    /// Calling `init` on an initialized clock does nothing. On failure the
    /// clock stays uninitialized and every other operation is a no-op.
    pub fn init(&self) -> TwResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let config = TimerConfig::microsecond_counter(
            self.timer.input_frequency(),
            self.precision_us,
        )
        .map_err(|err| {
            tw_warn!("clock init rejected: {}", self.precision_us);
            err
        })?;

        self.timer.disable();
        self.timer.configure(config)?;
        self.timer.set_counter(0);

        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.upper = 0;
            state.last_sync = 0;
            state.clear_callbacks();
            state.initialized = true;
        });
        self.timer.enable();

        tw_info!(
            "clock running, psc={} period={}us",
            config.prescaler,
            self.precision_us
        );
        Ok(())
    }

    /// Check if the clock has been initialized
    pub fn is_initialized(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).initialized)
    }

    /// Rollover interrupt entry point.
    ///
    /// Clears the timer's update flag and adds one hardware period to the
    /// upper count in one critical section, so [`now`](Self::now) never sees
    /// the flag cleared with the period unaccounted. Unless
    /// `suppress_callbacks` is set, every delayed callback whose deadline has
    /// been reached is submitted in slot order and its slot is freed.
    pub fn on_rollover(&self, suppress_callbacks: bool) {
        let due = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if !state.initialized {
                return Vec::new();
            }
            self.timer.clear_update();
            state.upper = state.upper.wrapping_add(self.precision_us as u64);
            if suppress_callbacks || state.high_water == 0 {
                return Vec::new();
            }
            let now = Timestamp::from_micros(state.upper + self.timer.counter() as u64);
            state.take_due(now)
        });

        for item in due {
            if self.queue.submit(item).is_err() {
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).stats.on_reject());
            }
        }
    }

    /// Current time in microseconds.
    ///
    /// The hardware register can wrap between reading it and reading the
    /// upper count, so the upper count is read on both sides of the register
    /// and the read is retried until they agree. A wrap whose interrupt is
    /// latched but not yet serviced is accounted for from the pending flag.
    pub fn now(&self) -> Timestamp {
        loop {
            let (initialized, upper) = critical_section::with(|cs| {
                let state = self.state.borrow_ref(cs);
                (state.initialized, state.upper)
            });
            if !initialized {
                return Timestamp::ZERO;
            }

            let lower = self.timer.counter();
            let pending = self.timer.update_pending();
            let upper_again = critical_section::with(|cs| self.state.borrow_ref(cs).upper);

            if upper == upper_again {
                return Timestamp::from_micros(self.compose(upper, lower, pending));
            }
        }
    }

    /// Alias for [`now`](Self::now)
    pub fn get_count(&self) -> Timestamp {
        self.now()
    }

    fn compose(&self, upper: u64, lower: u32, pending: bool) -> u64 {
        let mut total = upper.wrapping_add(lower as u64);
        if pending && lower < self.precision_us / 2 {
            total = total.wrapping_add(self.precision_us as u64);
        }
        total
    }

    /// Busy-wait for `micros` microseconds. Negative values return at once.
    ///
    /// Blocks the calling context entirely. Calling it from an interrupt at or
    /// above the clock's own priority stalls the clock for long waits.
    pub fn delay_us(&self, micros: i64) {
        if micros < 0 || !self.is_initialized() {
            return;
        }
        let end = self.now().saturating_add_micros(micros as u64);
        while self.now() < end {
            core::hint::spin_loop();
        }
    }

    /// Busy-wait for `millis` milliseconds
    pub fn delay_ms(&self, millis: u32) {
        self.delay_us(millis as i64 * MICROS_PER_MILLI as i64);
    }

    /// Run `action` from the main loop once `delay_ms` milliseconds have
    /// elapsed.
    ///
    /// The deadline is checked on rollover interrupts, so the effective delay
    /// is rounded up to the next hardware period. Returns the slot index.
    pub fn add_delayed_callback(&self, delay_ms: u32, action: Action) -> TwResult<usize> {
        self.add_delayed_work(delay_ms, WorkItem::new(action))
    }

    /// Like [`add_delayed_callback`](Self::add_delayed_callback) with a
    /// caller-supplied work item
    pub fn add_delayed_work(&self, delay_ms: u32, item: WorkItem) -> TwResult<usize> {
        if delay_ms == 0 {
            return Err(TwError::InvalidParameter);
        }
        if !self.is_initialized() {
            return Err(TwError::NotInitialized);
        }

        let deadline = self
            .now()
            .saturating_add_micros(delay_ms as u64 * MICROS_PER_MILLI);
        let result = critical_section::with(|cs| {
            self.state
                .borrow_ref_mut(cs)
                .insert(DelayedCallback { deadline, item })
        });
        match result {
            Ok(index) => tw_debug!("callback {} due at {}", index, deadline.as_micros()),
            Err(_) => tw_warn!("delayed callback table full"),
        }
        result
    }

    /// Fold drift against an external periodic reference into the clock.
    ///
    /// `expected_delay_us` is the time the reference says has passed since
    /// the previous call. The difference to the locally measured time is
    /// applied as a single step to the upper count, so timestamps jump at
    /// sync points, backwards when the local clock ran fast.
    pub fn synchronize(&self, expected_delay_us: u32) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if !state.initialized {
                return;
            }

            let current = self.compose(
                state.upper,
                self.timer.counter(),
                self.timer.update_pending(),
            );
            let expected = state.last_sync.saturating_add(expected_delay_us as u64);
            let delta = (expected as i128 - current as i128)
                .clamp(i64::MIN as i128, i64::MAX as i128) as i64;

            state.upper = state.upper.saturating_add_signed(delta);
            state.last_sync = self.compose(
                state.upper,
                self.timer.counter(),
                self.timer.update_pending(),
            );
            tw_debug!("clock synchronized, step {}us", delta);
        });
    }

    /// Return to time zero and drop every pending delayed callback
    pub fn reset(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if !state.initialized {
                return;
            }
            state.upper = 0;
            state.last_sync = 0;
            self.timer.set_counter(0);
            state.clear_callbacks();
        });
    }

    /// Microseconds accumulated from completed hardware periods
    pub fn upper_count(&self) -> u64 {
        critical_section::with(|cs| self.state.borrow_ref(cs).upper)
    }

    /// Live hardware register value
    pub fn lower_count(&self) -> u32 {
        self.timer.counter()
    }

    /// Microseconds per hardware period
    pub const fn precision_us(&self) -> u32 {
        self.precision_us
    }

    /// Time recorded by the last [`synchronize`](Self::synchronize)
    pub fn last_sync_time(&self) -> Timestamp {
        critical_section::with(|cs| Timestamp::from_micros(self.state.borrow_ref(cs).last_sync))
    }

    /// Number of delayed callbacks waiting for their deadline
    pub fn pending_callbacks(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).stats.in_use)
    }

    /// Callback table statistics
    pub fn stats(&self) -> SlotStats {
        critical_section::with(|cs| self.state.borrow_ref(cs).stats)
    }

    /// The backing timer
    pub fn timer(&self) -> &T {
        &self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() {}

    fn callback_at(deadline: u64) -> DelayedCallback {
        DelayedCallback {
            deadline: Timestamp::from_micros(deadline),
            item: WorkItem::new(Action::from_fn(noop)),
        }
    }

    #[test]
    fn take_due_returns_slot_order_and_shrinks_scan() {
        let mut state: ClockState<4> = ClockState::new();
        state.insert(callback_at(300)).unwrap();
        state.insert(callback_at(100)).unwrap();
        state.insert(callback_at(900)).unwrap();
        assert_eq!(state.high_water, 3);

        let due = state.take_due(Timestamp::from_micros(300));
        assert_eq!(due.len(), 2);
        assert_eq!(state.stats.in_use, 1);
        assert_eq!(state.high_water, 3);

        let due = state.take_due(Timestamp::from_micros(1_000));
        assert_eq!(due.len(), 1);
        assert_eq!(state.high_water, 0);
    }

    #[test]
    fn insert_reuses_first_free_slot() {
        let mut state: ClockState<2> = ClockState::new();
        assert_eq!(state.insert(callback_at(10)), Ok(0));
        assert_eq!(state.insert(callback_at(20)), Ok(1));
        assert_eq!(state.insert(callback_at(30)), Err(TwError::CallbackTableFull));

        state.take_due(Timestamp::from_micros(10));
        assert_eq!(state.insert(callback_at(40)), Ok(0));
        assert_eq!(state.stats.rejected, 1);
    }
}
