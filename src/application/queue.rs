//! Pending segment queue

use std::collections::VecDeque;

use crate::domain::session::Segment;

/// Holding area for segments whose transcription failed transiently.
///
/// FIFO; a replay pass drains a snapshot of the whole queue, so segments
/// arriving during the pass wait for the next connectivity event. A segment
/// is always in exactly one place: queued here, in flight, or resolved.
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: VecDeque<Segment>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail
    pub fn push(&mut self, segment: Segment) {
        self.items.push_back(segment);
    }

    /// Take the entire current contents for one replay pass
    pub fn take_all(&mut self) -> Vec<Segment> {
        self.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
