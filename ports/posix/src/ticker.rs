//! Periodic ticker threads
//!
//! On the host there are no timer interrupts. A [`Ticker`] plays the role of
//! one vector: a dedicated thread calls the handler at a fixed rate. Sleeping
//! until an absolute deadline rather than for a relative duration keeps the
//! rate drift-free.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tickwork_core::{TwError, TwResult};

/// Nanoseconds per second
const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Highest supported rate in hertz
pub const MAX_RATE_HZ: u32 = 100_000;

/// Tick period for a rate in hertz
pub fn period_for(rate_hz: u32) -> TwResult<Duration> {
    if rate_hz == 0 || rate_hz > MAX_RATE_HZ {
        return Err(TwError::InvalidParameter);
    }
    Ok(Duration::from_nanos(NSEC_PER_SEC / rate_hz as u64))
}

/// A thread invoking a handler at a fixed rate until stopped or dropped
pub struct Ticker {
    name: &'static str,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the ticker thread.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tickwork_posix::Ticker;
    ///
    /// let ticker = Ticker::start("tick", 100, || println!("tick")).unwrap();
    /// std::thread::sleep(std::time::Duration::from_millis(50));
    /// ticker.stop();
    /// ```
    pub fn start<F>(name: &'static str, rate_hz: u32, mut handler: F) -> TwResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let period = period_for(rate_hz)?;
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));

        let thread_running = Arc::clone(&running);
        let thread_ticks = Arc::clone(&ticks);
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let mut next_tick = Instant::now();
                while thread_running.load(Ordering::Relaxed) {
                    next_tick += period;
                    let now = Instant::now();
                    if next_tick > now {
                        thread::sleep(next_tick - now);
                    }
                    if !thread_running.load(Ordering::Relaxed) {
                        break;
                    }
                    handler();
                    thread_ticks.fetch_add(1, Ordering::Relaxed);
                }
            })
            .map_err(|_| TwError::Timer)?;

        log::debug!("ticker {} started at {} Hz", name, rate_hz);
        Ok(Self {
            name,
            running,
            ticks,
            handle: Some(handle),
        })
    }

    /// Number of handler invocations so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops the thread and waits for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("ticker {} handler panicked", self.name);
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
