//! Fixed-capacity history of accepted labels.

use stepsort_model::Label;

/// Ring buffer of the last `capacity` accepted labels, oldest first.
///
/// Slots are allocated once; after the buffer first fills, every push
/// overwrites the oldest slot and the length stays at `capacity`.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Label>,
    capacity: usize,
    /// Next slot to overwrite once full. Also the index of the oldest label.
    cursor: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer. `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Append a label, evicting the oldest one when full.
    pub fn push(&mut self, label: Label) {
        if self.slots.len() < self.capacity {
            self.slots.push(label);
            return;
        }
        self.slots[self.cursor] = label;
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// True once `capacity` labels have been pushed. Never reverts.
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Labels from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Label> + '_ {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    /// Copy of the contents, oldest first.
    pub fn snapshot(&self) -> Vec<Label> {
        self.iter().cloned().collect()
    }
}
