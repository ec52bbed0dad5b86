//! Deferred work queue implementation

use core::cell::RefCell;

use critical_section::Mutex;
use tickwork_core::{
    tw_trace, tw_warn, Action, SlotStats, TwError, TwResult, WorkItem, DEFAULT_QUEUE_DEPTH,
};

use crate::{Drain, WorkSink};

/// Queue storage guarded by the critical section
struct QueueState<const N: usize> {
    slots: [Option<WorkItem>; N],
    /// Number of entries written; the single source of truth for occupancy
    pending: usize,
    draining: bool,
    /// Leading entries the running drain pass drops when it ends
    retire_upto: usize,
    stats: SlotStats,
}

impl<const N: usize> QueueState<N> {
    const fn new() -> Self {
        Self {
            slots: [None; N],
            pending: 0,
            draining: false,
            retire_upto: 0,
            stats: SlotStats::new(N),
        }
    }

    fn push(&mut self, item: WorkItem) -> TwResult<()> {
        if self.pending >= N {
            self.stats.on_reject();
            return Err(TwError::QueueFull);
        }
        self.slots[self.pending] = Some(item);
        self.pending += 1;
        self.stats.on_acquire();
        Ok(())
    }

    /// Drop the first `count` entries and move anything queued behind them to
    /// the front.
    fn retire(&mut self, count: usize) {
        let end = self.pending;
        let remaining = end.saturating_sub(count);
        if remaining > 0 {
            self.slots.copy_within(count..end, 0);
        }
        for slot in &mut self.slots[remaining..end] {
            *slot = None;
        }
        self.pending = remaining;
        self.stats.on_release_many(count.min(end));
    }

    /// Discard everything pending. During a drain pass the entries are
    /// emptied in place and left for the pass to retire, so work enqueued
    /// after the clear keeps its place.
    fn clear(&mut self) {
        if self.draining {
            for slot in &mut self.slots[..self.pending] {
                *slot = None;
            }
            self.retire_upto = self.pending;
            return;
        }
        self.slots = [None; N];
        self.pending = 0;
        self.stats.on_clear();
    }
}

/// Bounded FIFO of deferred work.
///
/// Producers call [`enqueue`](Self::enqueue) from any context, including
/// nested interrupts. A single consumer calls [`drain`](Self::drain) from the
/// main loop. Every access to the slot array and the pending count happens
/// inside a critical section.
///
/// ```
/// use tickwork_queue::{Action, DeferredQueue};
///
/// static QUEUE: DeferredQueue<8> = DeferredQueue::new();
///
/// fn blink() {}
///
/// QUEUE.defer(Action::from_fn(blink)).unwrap();
/// assert_eq!(QUEUE.drain(), 1);
/// ```
pub struct DeferredQueue<const N: usize = DEFAULT_QUEUE_DEPTH> {
    state: Mutex<RefCell<QueueState<N>>>,
}

impl<const N: usize> DeferredQueue<N> {
    /// Create a new empty queue
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(QueueState::new())),
        }
    }

    /// Append an item at the tail.
    ///
    /// Returns [`TwError::QueueFull`] and drops the item when every slot is
    /// taken. Entries already queued are left untouched.
    pub fn enqueue(&self, item: WorkItem) -> TwResult<()> {
        let result = critical_section::with(|cs| self.state.borrow_ref_mut(cs).push(item));
        if result.is_err() {
            tw_warn!("deferred queue full, dropping {}", item.tag.unwrap_or("-"));
        }
        result
    }

    /// Enqueue an untagged action
    pub fn defer(&self, action: Action) -> TwResult<()> {
        self.enqueue(WorkItem::new(action))
    }

    /// Enqueue an action with a diagnostic tag
    pub fn defer_tagged(&self, action: Action, tag: &'static str) -> TwResult<()> {
        self.enqueue(WorkItem::tagged(action, tag))
    }

    /// Run every item that was pending when the call started, in FIFO order.
    ///
    /// Actions run with interrupts enabled. Items enqueued while the pass is in
    /// progress (by a nested interrupt or by a running action) are kept for the
    /// next call, which bounds the latency of a single call. A nested call
    /// from inside a running action returns 0 without doing anything.
    pub fn drain(&self) -> usize {
        let snapshot = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if state.draining || state.pending == 0 {
                return 0;
            }
            state.draining = true;
            state.retire_upto = state.pending;
            state.pending
        });
        if snapshot == 0 {
            return 0;
        }

        let mut executed = 0;
        for index in 0..snapshot {
            let item = critical_section::with(|cs| self.state.borrow_ref(cs).slots[index]);
            if let Some(item) = item {
                tw_trace!("drain {}", item.tag.unwrap_or("-"));
                item.run();
                executed += 1;

                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).slots[index] = None;
                });
            }
        }

        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let count = state.retire_upto;
            state.retire(count);
            state.draining = false;
        });

        executed
    }

    /// Discard all pending items without running them.
    ///
    /// Called from a running action, it also discards the rest of the current
    /// drain pass. Items enqueued after the call are kept.
    pub fn clear(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).clear());
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Get the number of pending items
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).pending)
    }

    /// Get the maximum capacity of the queue
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Occupancy statistics, including the number of dropped items
    pub fn stats(&self) -> SlotStats {
        critical_section::with(|cs| self.state.borrow_ref(cs).stats)
    }
}

impl<const N: usize> Default for DeferredQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> WorkSink for DeferredQueue<N> {
    fn submit(&self, item: WorkItem) -> TwResult<()> {
        self.enqueue(item)
    }
}

impl<const N: usize> Drain for DeferredQueue<N> {
    fn drain(&self) -> usize {
        DeferredQueue::drain(self)
    }

    fn is_idle(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static HITS: AtomicUsize = AtomicUsize::new(0);

    fn hit() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_queue_full() {
        let queue: DeferredQueue<2> = DeferredQueue::new();

        assert!(queue.defer(Action::from_fn(hit)).is_ok());
        assert!(queue.defer(Action::from_fn(hit)).is_ok());

        assert!(queue.is_full());
        assert_eq!(queue.defer(Action::from_fn(hit)), Err(TwError::QueueFull));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.stats().rejected, 1);
    }

    #[test]
    fn test_clear_discards_items() {
        let queue: DeferredQueue<4> = DeferredQueue::new();
        queue.defer(Action::from_fn(|| panic!("cleared work ran"))).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_retire_moves_late_entries_forward() {
        let mut state: QueueState<4> = QueueState::new();
        for tag in ["a", "b", "c"] {
            state.push(WorkItem::tagged(Action::from_fn(hit), tag)).unwrap();
        }
        state.retire(2);
        assert_eq!(state.pending, 1);
        assert_eq!(state.slots[0].and_then(|item| item.tag), Some("c"));
        assert!(state.slots[1].is_none());
        assert!(state.slots[2].is_none());
    }
}
