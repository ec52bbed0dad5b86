//! Tick-driven task table

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;
use tickwork_core::{
    tw_debug, tw_info, tw_trace, tw_warn, HardwareTimer, SlotStats, Tick, TimerConfig, TwError,
    TwResult, WorkItem, DEFAULT_MAX_TASKS,
};
use tickwork_queue::WorkSink;

use crate::task::{first_due, Task};
use crate::{SchedulerConfig, TaskConfig, TaskId};

struct SchedState<const N: usize> {
    initialized: bool,
    counter: Tick,
    slots: [Option<Task>; N],
    stats: SlotStats,
}

impl<const N: usize> SchedState<N> {
    const fn new() -> Self {
        Self {
            initialized: false,
            counter: Tick(0),
            slots: [None; N],
            stats: SlotStats::new(N),
        }
    }

    fn task_mut(&mut self, id: TaskId) -> TwResult<&mut Task> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TwError::InvalidTask)
    }

    fn task(&self, id: TaskId) -> Option<&Task> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Advance the counter by one tick and collect the work that came due.
    fn tick(&mut self, rollover: u32) -> Vec<WorkItem, N> {
        let (counter, wrapped) = self.counter.advance(1, rollover);
        self.counter = counter;

        let mut due = Vec::new();
        for slot in &mut self.slots {
            let Some(task) = slot else {
                continue;
            };
            if wrapped {
                if task.due_after_wrap {
                    task.due_after_wrap = false;
                } else {
                    // Due tick belongs to the previous lap, it has passed.
                    task.next_due = Tick(0);
                }
            }
            if !task.is_due(counter) {
                continue;
            }

            // One entry per slot at most, the push cannot fail.
            let _ = due.push(task.item);
            if task.is_one_shot() {
                *slot = None;
                self.stats.on_release();
            } else {
                let (next_due, after_wrap) = counter.advance(task.interval, rollover);
                task.next_due = next_due;
                task.due_after_wrap = after_wrap;
            }
        }
        due
    }
}

/// Fixed-capacity scheduler of periodic and one-shot tasks.
///
/// Holds up to `N` tasks. Each call to [`update`](Self::update) advances the
/// tick counter, which wraps to zero at the configured rollover, and submits
/// every due task to the work sink `Q` in slot order.
pub struct Scheduler<'q, T, Q, const N: usize = DEFAULT_MAX_TASKS> {
    timer: T,
    queue: &'q Q,
    tick_hz: u32,
    rollover: u32,
    state: Mutex<RefCell<SchedState<N>>>,
}

impl<'q, T, Q, const N: usize> Scheduler<'q, T, Q, N>
where
    T: HardwareTimer,
    Q: WorkSink,
{
    /// Create an uninitialized scheduler
    pub const fn new(timer: T, queue: &'q Q, config: SchedulerConfig) -> Self {
        Self {
            timer,
            queue,
            tick_hz: config.tick_hz,
            rollover: config.rollover,
            state: Mutex::new(RefCell::new(SchedState::new())),
        }
    }

    /// Program the tick timer and start it.
    ///
    /// Calling `init` again on a running scheduler does nothing. On failure
    /// the scheduler stays uninitialized.
    pub fn init(&self) -> TwResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let input_hz = self.timer.input_frequency();
        if self.tick_hz == 0 || self.tick_hz > input_hz || self.rollover == 0 {
            tw_warn!("scheduler rejected tick rate {}Hz", self.tick_hz);
            return Err(TwError::InvalidParameter);
        }
        let config = TimerConfig::for_tick(input_hz, self.tick_hz)?;

        self.timer.disable();
        self.timer.configure(config)?;
        self.timer.set_counter(0);

        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.counter = Tick(0);
            state.slots = [None; N];
            state.stats.on_clear();
            state.initialized = true;
        });
        self.timer.enable();

        tw_info!(
            "scheduler running at {}Hz, {} slots, psc={}",
            self.tick_hz,
            N,
            config.prescaler
        );
        Ok(())
    }

    /// Check if the scheduler has been initialized
    pub fn is_initialized(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).initialized)
    }

    /// Register a task.
    ///
    /// Interval and start offset must both be below the rollover. The task
    /// takes the lowest free slot, whose index is returned.
    pub fn add_task(&self, config: TaskConfig) -> TwResult<TaskId> {
        if config.interval >= self.rollover || config.start_offset >= self.rollover {
            return Err(TwError::InvalidParameter);
        }

        let result = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if !state.initialized {
                return Err(TwError::NotInitialized);
            }

            let Some(index) = state.slots.iter().position(Option::is_none) else {
                state.stats.on_reject();
                return Err(TwError::TaskTableFull);
            };
            let (next_due, due_after_wrap) = first_due(
                state.counter,
                config.interval,
                config.start_offset,
                self.rollover,
            );
            state.slots[index] = Some(Task {
                item: config.work_item(),
                interval: config.interval,
                start_offset: config.start_offset,
                next_due,
                due_after_wrap,
                enabled: config.enabled,
            });
            state.stats.on_acquire();
            Ok((TaskId(index), next_due))
        });

        match result {
            Ok((id, next_due)) => {
                tw_debug!("task {} added, first due at {}", id.index(), next_due.raw());
                Ok(id)
            }
            Err(err) => {
                if err == TwError::TaskTableFull {
                    tw_warn!("task table full");
                }
                Err(err)
            }
        }
    }

    /// Tick interrupt entry point.
    ///
    /// Advances the counter and submits every enabled task whose due tick has
    /// been reached, in slot order. One-shot tasks free their slot; periodic
    /// ones are rescheduled one interval after the current tick, so missed
    /// periods are skipped rather than replayed.
    pub fn update(&self) {
        let due = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if !state.initialized {
                return Vec::new();
            }
            self.timer.clear_update();
            state.tick(self.rollover)
        });

        for item in due {
            tw_trace!("submit {}", item.tag.unwrap_or("-"));
            if self.queue.submit(item).is_err() {
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).stats.on_reject());
                tw_warn!("scheduled work dropped: {}", item.tag.unwrap_or("-"));
            }
        }
    }

    /// Free a task slot
    pub fn remove_task(&self, id: TaskId) -> TwResult<()> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.task_mut(id)?;
            state.slots[id.index()] = None;
            state.stats.on_release();
            Ok(())
        })
    }

    /// Let a task fire again. A task whose due tick passed while it was
    /// disabled fires on the next tick.
    pub fn enable_task(&self, id: TaskId) -> TwResult<()> {
        self.with_task(id, |task| task.enabled = true)
    }

    /// Stop a task from firing while keeping its slot
    pub fn disable_task(&self, id: TaskId) -> TwResult<()> {
        self.with_task(id, |task| task.enabled = false)
    }

    /// Change a task's interval. Takes effect after its next firing.
    pub fn set_interval(&self, id: TaskId, interval: u32) -> TwResult<()> {
        if interval >= self.rollover {
            return Err(TwError::InvalidParameter);
        }
        self.with_task(id, |task| task.interval = interval)
    }

    /// Interval of a task, 0 for one-shot tasks and empty or invalid slots
    pub fn interval(&self, id: TaskId) -> u32 {
        critical_section::with(|cs| {
            self.state
                .borrow_ref(cs)
                .task(id)
                .map_or(0, |task| task.interval)
        })
    }

    /// Start offset a task was registered with, 0 for empty or invalid slots
    pub fn start_offset(&self, id: TaskId) -> u32 {
        critical_section::with(|cs| {
            self.state
                .borrow_ref(cs)
                .task(id)
                .map_or(0, |task| task.start_offset)
        })
    }

    /// Whether a task exists and is enabled
    pub fn is_enabled(&self, id: TaskId) -> bool {
        critical_section::with(|cs| {
            self.state
                .borrow_ref(cs)
                .task(id)
                .is_some_and(|task| task.enabled)
        })
    }

    /// Tick at which a task fires next
    pub fn next_due(&self, id: TaskId) -> Option<Tick> {
        critical_section::with(|cs| self.state.borrow_ref(cs).task(id).map(|task| task.next_due))
    }

    fn with_task(&self, id: TaskId, f: impl FnOnce(&mut Task)) -> TwResult<()> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            f(state.task_mut(id)?);
            Ok(())
        })
    }

    /// Current tick counter
    pub fn counter(&self) -> Tick {
        critical_section::with(|cs| self.state.borrow_ref(cs).counter)
    }

    /// Tick rate in hertz
    pub const fn frequency(&self) -> u32 {
        self.tick_hz
    }

    /// Tick counter modulus
    pub const fn rollover(&self) -> u32 {
        self.rollover
    }

    /// Number of task slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of occupied task slots
    pub fn task_count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).stats.in_use)
    }

    /// Task table statistics
    pub fn stats(&self) -> SlotStats {
        critical_section::with(|cs| self.state.borrow_ref(cs).stats)
    }

    /// The backing timer
    pub fn timer(&self) -> &T {
        &self.timer
    }
}
