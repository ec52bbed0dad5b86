//! Task descriptors

use core::fmt;

use tickwork_core::{Action, Tick, WorkItem};

/// Handle to a scheduler slot.
///
/// Only valid while the slot is not reused: once a one-shot task has fired or
/// a task was removed, the same id may name a different task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Slot index
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "task#{}", self.0);
    }
}

/// Registration parameters for [`Scheduler::add_task`].
///
/// [`Scheduler::add_task`]: crate::Scheduler::add_task
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    pub action: Action,
    pub tag: Option<&'static str>,
    /// Ticks between firings, 0 for a one-shot task
    pub interval: u32,
    /// Phase of the firing sequence within the tick counter
    pub start_offset: u32,
    pub enabled: bool,
}

impl TaskConfig {
    /// Enabled one-shot task at offset 0
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            tag: None,
            interval: 0,
            start_offset: 0,
            enabled: true,
        }
    }

    pub const fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub const fn start_offset(mut self, start_offset: u32) -> Self {
        self.start_offset = start_offset;
        self
    }

    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Label carried into the work queue for diagnostics
    pub const fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    pub(crate) const fn work_item(&self) -> WorkItem {
        WorkItem {
            action: self.action,
            tag: self.tag,
        }
    }
}

impl From<Action> for TaskConfig {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}

/// An occupied scheduler slot
#[derive(Debug, Clone, Copy)]
pub(crate) struct Task {
    pub item: WorkItem,
    pub interval: u32,
    pub start_offset: u32,
    pub next_due: Tick,
    /// `next_due` lies beyond the next counter wrap. Without it, a
    /// `next_due` still pending at a wrap is overdue and is reset to 0.
    pub due_after_wrap: bool,
    pub enabled: bool,
}

impl Task {
    pub const fn is_one_shot(&self) -> bool {
        self.interval == 0
    }

    pub fn is_due(&self, counter: Tick) -> bool {
        self.enabled && !self.due_after_wrap && self.next_due <= counter
    }
}

/// First tick at which a task registered at `counter` fires.
///
/// An offset still ahead of the counter is used as is. Otherwise a periodic
/// task fires at the next tick after `counter` congruent to the offset modulo
/// the interval, and a one-shot task on the very next tick.
pub(crate) fn first_due(
    counter: Tick,
    interval: u32,
    start_offset: u32,
    rollover: u32,
) -> (Tick, bool) {
    if start_offset > counter.raw() {
        return (Tick(start_offset), false);
    }
    if interval == 0 {
        return counter.advance(1, rollover);
    }
    let phase = (counter.raw() - start_offset) % interval;
    counter.advance(interval - phase, rollover)
}
