// Fixed-capacity sliding windows of scalar features, one per (gesture, feature)

use std::collections::{HashMap, VecDeque};

use crate::gestures::types::{GestureKind, MotionFeature};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub gesture: GestureKind,
    pub feature: MotionFeature,
}

impl HistoryKey {
    pub fn new(gesture: GestureKind, feature: MotionFeature) -> Self {
        HistoryKey { gesture, feature }
    }
}

/// Owned by a single challenge and dropped with it.
/// Invariant: no buffer ever holds more than `capacity` samples.
#[derive(Clone, Debug)]
pub struct MotionHistory {
    capacity: usize,
    buffers: HashMap<HistoryKey, VecDeque<f32>>,
}

impl MotionHistory {
    pub fn new(capacity: usize) -> Self {
        MotionHistory {
            capacity: capacity.max(1),
            buffers: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a sample, evicting the oldest one once the buffer is full.
    pub fn push(&mut self, key: HistoryKey, value: f32) {
        let capacity = self.capacity;
        let buffer = self
            .buffers
            .entry(key)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        if buffer.len() == capacity {
            buffer.pop_front();
        }
        buffer.push_back(value);
    }

    /// Samples in arrival order, oldest first.
    pub fn window(&self, key: HistoryKey) -> Vec<f32> {
        self.buffers
            .get(&key)
            .map(|buffer| buffer.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, key: HistoryKey) -> usize {
        self.buffers.get(&key).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(VecDeque::is_empty)
    }

    /// Drops one buffer, or every buffer when `key` is `None`.
    pub fn clear(&mut self, key: Option<HistoryKey>) {
        match key {
            Some(key) => {
                self.buffers.remove(&key);
            }
            None => self.buffers.clear(),
        }
    }

    /// Drops every buffer that belongs to `gesture`.
    pub fn clear_gesture(&mut self, gesture: GestureKind) {
        self.buffers.retain(|key, _| key.gesture != gesture);
    }
}
