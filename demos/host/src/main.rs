//! Host demonstration of the tickwork components.
//!
//! Two ticker threads play the interrupt vectors of a microcontroller: one
//! drives the scheduler tick, the other counts the clock's simulated 1 MHz
//! timer and services its rollovers. A third one stands in for a
//! pulse-per-second reference the clock synchronizes against. The main thread
//! is the cooperative main loop draining the work queue.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tickwork_clock::{ClockConfig, ExtendedClock};
use tickwork_core::{Action, HardwareTimer, WorkItem};
use tickwork_posix::{SimTimer, Ticker, DEFAULT_INPUT_HZ};
use tickwork_queue::DeferredQueue;
use tickwork_rt::MainLoop;
use tickwork_sched::{Scheduler, SchedulerConfig, TaskConfig};

/// Rate of the thread counting the clock timer, in hertz
const CLOCK_SERVICE_HZ: u32 = 10_000;

type DemoClock = ExtendedClock<'static, &'static SimTimer, DeferredQueue>;
type DemoScheduler = Scheduler<'static, &'static SimTimer, DeferredQueue>;

static QUEUE: DeferredQueue = DeferredQueue::new();
static CLOCK_TIMER: SimTimer = SimTimer::new(DEFAULT_INPUT_HZ);
static TICK_TIMER: SimTimer = SimTimer::new(DEFAULT_INPUT_HZ);

static CLOCK: OnceLock<DemoClock> = OnceLock::new();
static SCHED: OnceLock<DemoScheduler> = OnceLock::new();

static SAMPLES: AtomicU32 = AtomicU32::new(0);

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the tickwork scheduling backbone on the host")]
struct Opts {
    /// How long to run, in seconds
    #[arg(long, default_value_t = 3)]
    seconds: u64,

    /// Scheduler tick rate in hertz
    #[arg(long, default_value_t = 1_000)]
    tick_hz: u32,

    /// Clock timer rollover period in microseconds
    #[arg(long, default_value_t = 10_000)]
    precision_us: u32,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    init_tracing(&opts.log_level);

    let clock = CLOCK.get_or_init(|| {
        ExtendedClock::new(&CLOCK_TIMER, &QUEUE, ClockConfig::new(opts.precision_us))
    });
    let sched = SCHED.get_or_init(|| {
        Scheduler::new(&TICK_TIMER, &QUEUE, SchedulerConfig::new(opts.tick_hz))
    });

    clock.init().context("extended clock init")?;
    sched.init().context("scheduler init")?;
    register_work(clock, sched)?;

    let step_us = 1_000_000 / CLOCK_SERVICE_HZ;
    let clock_isr = Ticker::start("clock-isr", CLOCK_SERVICE_HZ, move || {
        for _ in 0..CLOCK_TIMER.advance(step_us as u64) {
            clock.on_rollover(false);
        }
    })?;
    let tick_isr = Ticker::start("tick-isr", opts.tick_hz, move || sched.update())?;
    let pps_isr = Ticker::start("pps-isr", 1, move || clock.synchronize(1_000_000))?;

    let main_loop = MainLoop::with_idle(&QUEUE, idle);
    let end = Instant::now() + Duration::from_secs(opts.seconds);
    while Instant::now() < end {
        main_loop.poll();
    }

    pps_isr.stop();
    tick_isr.stop();
    clock_isr.stop();
    main_loop.run_until_idle();

    info!(
        now = %clock.now(),
        ticks = %sched.counter(),
        samples = SAMPLES.load(Ordering::Relaxed),
        main_loop = %main_loop.stats(),
        "demo finished"
    );
    let dropped = QUEUE.stats().rejected + sched.stats().rejected + clock.stats().rejected;
    if dropped > 0 {
        warn!(dropped, "work was dropped");
    }
    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_thread_names(true)
        .init();
}

fn register_work(clock: &DemoClock, sched: &DemoScheduler) -> Result<()> {
    let hz = sched.frequency();

    sched
        .add_task(
            TaskConfig::new(Action::from_fn(heartbeat))
                .interval(hz / 2)
                .tag("heartbeat"),
        )
        .context("heartbeat task")?;
    sched
        .add_task(
            TaskConfig::new(Action::from_fn(sample))
                .interval(hz / 10)
                .start_offset(hz / 20)
                .tag("sample"),
        )
        .context("sample task")?;
    sched
        .add_task(
            TaskConfig::new(Action::with_arg(announce, 1))
                .start_offset(hz / 4)
                .tag("one-shot"),
        )
        .context("one-shot task")?;

    clock
        .add_delayed_work(
            1_500,
            WorkItem::tagged(Action::with_arg(announce, 2), "delayed"),
        )
        .context("delayed callback")?;
    Ok(())
}

fn idle() {
    thread::sleep(Duration::from_micros(200));
}

fn heartbeat() {
    if let (Some(clock), Some(sched)) = (CLOCK.get(), SCHED.get()) {
        info!(
            now = %clock.now(),
            tick = %sched.counter(),
            last_sync = %clock.last_sync_time(),
            "heartbeat"
        );
    }
}

fn sample() {
    SAMPLES.fetch_add(1, Ordering::Relaxed);
}

fn announce(source: usize) {
    let now = CLOCK.get().map(|clock| clock.now());
    match source {
        1 => info!(?now, "one-shot task ran"),
        _ => info!(?now, timer = CLOCK_TIMER.counter(), "delayed callback ran"),
    }
}
