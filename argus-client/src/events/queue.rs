//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Per-subscriber event queue.
//!
//! Bounded, with drop-oldest overflow: a slow subscriber loses its oldest
//! events (counted, never silent) instead of growing without bound or
//! blocking the session's receive task.

use super::types::SessionEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// A bounded single-consumer event queue.
#[derive(Debug)]
pub(crate) struct EventQueue {
    capacity: usize,
    events: Mutex<VecDeque<SessionEvent>>,
    notify: Notify,
    dropped: AtomicU64,
    closed: AtomicBool,
}

impl EventQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueues an event, dropping the oldest one on overflow.
    ///
    /// Never blocks; the dispatch path must not stall the receive task.
    pub(crate) fn push(&self, event: SessionEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        {
            let mut events = self.events.lock();
            if events.len() == self.capacity {
                events.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            events.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Dequeues the next event, waiting if the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub(crate) async fn recv(&self) -> Option<SessionEvent> {
        loop {
            let notified = self.notify.notified();
            if let Some(event) = self.events.lock().pop_front() {
                return Some(event);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    /// Closes the queue, waking any blocked receiver.
    ///
    /// Already-queued events remain receivable.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    /// Returns how many events were dropped to overflow.
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Returns the number of queued events.
    pub(crate) fn len(&self) -> usize {
        self.events.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn event(code: u32) -> SessionEvent {
        SessionEvent::Notification {
            code,
            data: u64::from(code),
        }
    }

    fn code_of(event: &SessionEvent) -> u32 {
        match event {
            SessionEvent::Notification { code, .. } => *code,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_push_recv_in_order() {
        let queue = EventQueue::new(8);
        queue.push(event(1));
        queue.push(event(2));
        queue.push(event(3));

        assert_eq!(code_of(&queue.recv().await.unwrap()), 1);
        assert_eq!(code_of(&queue.recv().await.unwrap()), 2);
        assert_eq!(code_of(&queue.recv().await.unwrap()), 3);
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_overflow_drops_oldest_and_counts() {
        let queue = EventQueue::new(3);
        for code in 1..=7 {
            queue.push(event(code));
        }
        assert_eq!(queue.dropped(), 4);
        assert_eq!(queue.len(), 3);

        // The oldest events went first; the latest three remain.
        assert_eq!(code_of(&queue.recv().await.unwrap()), 5);
        assert_eq!(code_of(&queue.recv().await.unwrap()), 6);
        assert_eq!(code_of(&queue.recv().await.unwrap()), 7);
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push() {
        let queue = Arc::new(EventQueue::new(4));
        let receiver = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.recv().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        queue.push(event(9));
        let received = receiver.await.unwrap().unwrap();
        assert_eq!(code_of(&received), 9);
    }

    #[tokio::test]
    async fn test_close_wakes_receiver_and_drains() {
        let queue = Arc::new(EventQueue::new(4));
        queue.push(event(1));
        queue.close();

        // Queued events remain receivable after close.
        assert_eq!(code_of(&queue.recv().await.unwrap()), 1);
        assert!(queue.recv().await.is_none());

        // Pushes after close are discarded.
        queue.push(event(2));
        assert!(queue.recv().await.is_none());
    }
}
