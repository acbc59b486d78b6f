//! Pending-work queue.
//!
//! Plain FIFO with no capacity bound. Enqueue also tracks the observed range
//! of durations for the summary; the range never influences scheduling.

use std::collections::VecDeque;

use crate::model::{DurationRange, WorkItem};

#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    items: VecDeque<WorkItem>,
    observed: Option<DurationRange>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item at the back, widening the observed duration range.
    pub fn enqueue(&mut self, item: WorkItem) {
        self.observed = Some(DurationRange::observe(self.observed, item.duration));
        self.items.push_back(item);
    }

    /// Remove the item that arrived first.
    pub fn dequeue_front(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Range of every duration ever enqueued, or `None` before the first.
    pub fn observed_range(&self) -> Option<DurationRange> {
        self.observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobKind;

    fn item(duration: u64) -> WorkItem {
        WorkItem::new("10.0.0.1", "10.0.0.2", duration, JobKind::Processing)
    }

    #[test]
    fn dequeues_in_arrival_order() {
        let mut queue = PendingQueue::new();
        for d in [5, 1, 9] {
            queue.enqueue(item(d));
        }

        let order: Vec<_> = std::iter::from_fn(|| queue.dequeue_front())
            .map(|i| i.duration)
            .collect();
        assert_eq!(order, vec![5, 1, 9]);
        assert!(queue.is_empty());
    }

    #[test]
    fn observed_range_tracks_min_and_max() {
        let mut queue = PendingQueue::new();
        assert_eq!(queue.observed_range(), None);

        for d in [7, 3, 19, 11] {
            queue.enqueue(item(d));
        }
        assert_eq!(
            queue.observed_range(),
            Some(DurationRange { min: 3, max: 19 })
        );
    }

    #[test]
    fn observed_range_survives_dequeue() {
        let mut queue = PendingQueue::new();
        queue.enqueue(item(4));
        queue.enqueue(item(12));
        queue.dequeue_front();
        queue.dequeue_front();

        assert_eq!(queue.len(), 0);
        assert_eq!(
            queue.observed_range(),
            Some(DurationRange { min: 4, max: 12 })
        );
    }
}
