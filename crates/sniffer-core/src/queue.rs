//! Bounded drop-oldest FIFOs between the capture thread and consumers.
//!
//! The capture side never blocks: pushing into a full queue discards the
//! oldest item and bumps the overflow counter. Consumers await items and
//! keep draining after close until the queue is empty, so nothing observed
//! before a stop is lost on the consumer side.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::warn;

#[derive(Debug)]
pub struct EventQueue<T> {
    items: Mutex<VecDeque<T>>,
    cap: usize,
    notify: Notify,
    closed: AtomicBool,
    overflows: AtomicU64,
}

impl<T> EventQueue<T> {
    pub fn new(cap: usize) -> EventQueue<T> {
        EventQueue {
            items: Mutex::new(VecDeque::with_capacity(cap.min(1024))),
            cap,
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            overflows: AtomicU64::new(0),
        }
    }

    /// Push an item, discarding the oldest one when full. Returns false when
    /// something was discarded.
    pub fn push(&self, item: T) -> bool {
        let dropped = {
            let mut items = self.items.lock().expect("queue mutex poisoned");
            let dropped = if items.len() >= self.cap {
                items.pop_front();
                true
            } else {
                false
            };
            items.push_back(item);
            dropped
        };
        if dropped {
            let total = self.overflows.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(total, "event queue full, dropped oldest item");
        }
        self.notify.notify_one();
        !dropped
    }

    /// Wait for the next item. Returns `None` once the queue is closed *and*
    /// drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut items = self.items.lock().expect("queue mutex poisoned");
                if let Some(item) = items.pop_front() {
                    return Some(item);
                }
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    /// Mark the queue closed; consumers finish draining and then stop.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items discarded because the queue was full.
    pub fn overflows(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_over_cap_discards_oldest() {
        let queue = EventQueue::new(3);
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert!(queue.push(3));
        assert!(!queue.push(4));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.overflows(), 1);
    }

    #[tokio::test]
    async fn pop_drains_in_order() {
        let queue = EventQueue::new(8);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.pop().await, Some("a"));
        assert_eq!(queue.pop().await, Some("b"));
    }

    #[tokio::test]
    async fn close_lets_consumer_drain_then_stop() {
        let queue = EventQueue::new(8);
        queue.push(1);
        queue.push(2);
        queue.close();
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn pop_wakes_on_push() {
        use std::sync::Arc;
        let queue = Arc::new(EventQueue::new(8));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;
        queue.push(42);
        assert_eq!(consumer.await.unwrap(), Some(42));
    }
}
