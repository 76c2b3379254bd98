use huddle_core::CaptionMessage;
use std::collections::VecDeque;

/// Most recent captions, oldest first. Full buffers drop from the front.
#[derive(Debug, Clone)]
pub struct CaptionBuffer {
    capacity: usize,
    entries: VecDeque<CaptionMessage>,
}

impl CaptionBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, caption: CaptionMessage) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(caption);
    }

    pub fn latest(&self) -> Option<&CaptionMessage> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptionMessage> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<CaptionMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
