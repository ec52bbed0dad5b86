//! Occupancy counters for fixed slot tables

use core::fmt;

/// Slot table statistics for monitoring and debugging.
///
/// Dropped work is otherwise invisible, so every table keeps a count of the
/// requests it had to turn away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStats {
    /// Total number of slots in the table
    pub capacity: usize,
    /// Number of occupied slots
    pub in_use: usize,
    /// Highest occupancy ever reached
    pub peak_in_use: usize,
    /// Requests rejected because the table was full or a submission failed
    pub rejected: u32,
}

impl SlotStats {
    /// Create statistics for an empty table
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: 0,
            peak_in_use: 0,
            rejected: 0,
        }
    }

    /// Update statistics after a slot was taken
    pub fn on_acquire(&mut self) {
        if self.in_use < self.capacity {
            self.in_use += 1;
        }
        if self.in_use > self.peak_in_use {
            self.peak_in_use = self.in_use;
        }
    }

    /// Update statistics after a slot was freed
    pub fn on_release(&mut self) {
        self.in_use = self.in_use.saturating_sub(1);
    }

    /// Update statistics after `count` slots were freed at once
    pub fn on_release_many(&mut self, count: usize) {
        self.in_use = self.in_use.saturating_sub(count);
    }

    /// Record a rejected request
    pub fn on_reject(&mut self) {
        self.rejected = self.rejected.saturating_add(1);
    }

    /// Forget current occupancy (table cleared), keeping the history
    pub fn on_clear(&mut self) {
        self.in_use = 0;
    }

    /// Free slots
    pub const fn available(&self) -> usize {
        self.capacity - self.in_use
    }

    /// Check if every slot is occupied
    pub const fn is_full(&self) -> bool {
        self.in_use >= self.capacity
    }

    /// Check if no slot is occupied
    pub const fn is_empty(&self) -> bool {
        self.in_use == 0
    }

    /// Get utilization as a percentage (0-100)
    pub fn utilization(&self) -> u8 {
        if self.capacity == 0 {
            0
        } else {
            ((self.in_use * 100) / self.capacity) as u8
        }
    }
}

impl fmt::Display for SlotStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} in use (peak {}), {} rejected",
            self.in_use, self.capacity, self.peak_in_use, self.rejected
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SlotStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "SlotStats{{ capacity: {}, in_use: {}, peak: {}, rejected: {} }}",
            self.capacity,
            self.in_use,
            self.peak_in_use,
            self.rejected
        );
    }
}
