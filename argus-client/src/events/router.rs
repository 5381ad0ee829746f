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

//! Fan-out of server pushes to category subscribers.
//!
//! Dispatch runs on the session's single receive task: every subscriber
//! therefore sees a given source's events in receipt order (no ordering
//! is guaranteed across different sources). Subscribers consume from
//! their own bounded queue, so a slow or failed subscriber loses its own
//! events but can never delay another subscriber or the receive loop.

use super::queue::EventQueue;
use super::types::{EventCategory, SessionEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Routes session events to registered subscribers.
#[derive(Debug)]
pub struct EventRouter {
    subscribers: Mutex<HashMap<u64, SubscriberEntry>>,
    next_id: AtomicU64,
    queue_capacity: usize,
    closed: AtomicBool,
}

#[derive(Debug)]
struct SubscriberEntry {
    category: EventCategory,
    queue: Arc<EventQueue>,
}

impl EventRouter {
    /// Creates a router whose subscriber queues hold `queue_capacity`
    /// events each.
    pub(crate) fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity,
            closed: AtomicBool::new(false),
        }
    }

    /// Registers a subscriber for one event category.
    ///
    /// The subscription is removed when [`Subscription::unsubscribe`] is
    /// called or the handle is dropped.
    pub(crate) fn subscribe(router: &Arc<Self>, category: EventCategory) -> Subscription {
        let id = router.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(EventQueue::new(router.queue_capacity));
        if router.closed.load(Ordering::Acquire) {
            queue.close();
        } else {
            router.subscribers.lock().insert(
                id,
                SubscriberEntry {
                    category,
                    queue: Arc::clone(&queue),
                },
            );
        }
        debug!(subscription = id, %category, "subscriber registered");
        Subscription {
            id,
            category,
            queue,
            router: Arc::downgrade(router),
        }
    }

    /// Delivers one event to every subscriber of its category.
    ///
    /// Runs on the receive task; enqueueing never blocks.
    pub(crate) fn dispatch(&self, event: &SessionEvent) {
        let category = event.category();
        let subscribers = self.subscribers.lock();
        for entry in subscribers.values() {
            if entry.category == category {
                entry.queue.push(event.clone());
            }
        }
    }

    /// Closes every subscriber queue; part of session teardown.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let subscribers = self.subscribers.lock();
        for entry in subscribers.values() {
            entry.queue.close();
        }
    }

    /// Returns the number of active subscriptions.
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn remove(&self, id: u64) {
        if let Some(entry) = self.subscribers.lock().remove(&id) {
            entry.queue.close();
            debug!(subscription = id, "subscriber removed");
        }
    }
}

/// A handle to an active event subscription.
///
/// Events are received with [`Subscription::recv`]; dropping the handle
/// unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    category: EventCategory,
    queue: Arc<EventQueue>,
    router: Weak<EventRouter>,
}

impl Subscription {
    /// Returns the category this subscription delivers.
    #[must_use]
    pub const fn category(&self) -> EventCategory {
        self.category
    }

    /// Receives the next event.
    ///
    /// Returns `None` once the subscription is closed (session teardown
    /// or explicit unsubscribe) and the queue is drained.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.queue.recv().await
    }

    /// Returns how many events this subscriber lost to queue overflow.
    ///
    /// The queue drops its oldest events when the subscriber falls
    /// behind; the count makes that loss observable.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    /// Removes the subscription explicitly.
    pub fn unsubscribe(self) {
        // Removal happens in Drop.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(router) = self.router.upgrade() {
            router.remove(self.id);
        }
    }
}
