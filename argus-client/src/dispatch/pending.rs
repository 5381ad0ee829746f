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

//! Tracking of in-flight requests awaiting replies.

use super::error::RequestError;
use crate::protocol::Message;
use std::collections::HashMap;
use tokio::sync::{Mutex, oneshot};

/// One pending entry: the waiting caller plus any accumulated reply
/// chunks.
#[derive(Debug)]
struct Entry {
    tx: oneshot::Sender<Result<Message, RequestError>>,
    partial: Option<Message>,
}

/// Tracks in-flight requests and routes replies to the correct caller.
///
/// A pending entry lives from the moment a request is sent until a final
/// reply arrives, the request times out or is cancelled, or the channel
/// closes. Multi-part replies are accumulated here: chunks flagged
/// "more follows" merge into the entry's partial result, and only the
/// completed message is handed to the waiting caller.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: Mutex<HashMap<u64, Entry>>,
}

impl PendingRequests {
    /// Creates an empty pending table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending request, returning the receiver the caller
    /// waits on.
    pub async fn register(&self, request_id: u64) -> oneshot::Receiver<Result<Message, RequestError>> {
        let (tx, rx) = oneshot::channel();
        self.entries
            .lock()
            .await
            .insert(request_id, Entry { tx, partial: None });
        rx
    }

    /// Feeds a reply in.
    ///
    /// A chunk with the more-follows flag is absorbed into the entry's
    /// partial result and the entry stays registered; the final chunk
    /// resolves the caller with the accumulated message. Returns `false`
    /// if no entry matches the reply's request id (the caller timed out,
    /// cancelled, or never existed).
    pub async fn complete(&self, reply: Message) -> bool {
        let mut entries = self.entries.lock().await;
        let request_id = reply.request_id();

        if reply.has_more() {
            let Some(entry) = entries.get_mut(&request_id) else {
                return false;
            };
            match &mut entry.partial {
                Some(partial) => partial.absorb(reply),
                None => entry.partial = Some(reply),
            }
            return true;
        }

        let Some(entry) = entries.remove(&request_id) else {
            return false;
        };
        let result = match entry.partial {
            Some(mut partial) => {
                partial.absorb(reply);
                partial
            }
            None => reply,
        };
        entry.tx.send(Ok(result)).is_ok()
    }

    /// Removes a pending entry without resolving the caller.
    ///
    /// Returns `true` if the entry existed. Used on timeout and
    /// cancellation; any reply arriving later finds no entry and is
    /// discarded.
    pub async fn cancel(&self, request_id: u64) -> bool {
        self.entries.lock().await.remove(&request_id).is_some()
    }

    /// Resolves every pending entry with [`RequestError::Closed`].
    ///
    /// Called exactly when the channel goes down; no request waits past
    /// channel lifetime.
    pub async fn fail_all(&self) {
        let mut entries = self.entries.lock().await;
        for (_, entry) in entries.drain() {
            let _ = entry.tx.send(Err(RequestError::Closed));
        }
    }

    /// Returns the number of in-flight requests.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no requests are in flight.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Message, codes, fields, flags};

    #[tokio::test]
    async fn test_register_and_complete() {
        let pending = PendingRequests::new();
        let rx = pending.register(42).await;
        assert_eq!(pending.len().await, 1);

        let mut reply = Message::new(codes::REQUEST_COMPLETED, 42);
        reply.set_u32(fields::RESULT_CODE, 0);
        assert!(pending.complete(reply).await);

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.get_u32(fields::RESULT_CODE), Some(0));
        assert!(pending.is_empty().await);
    }

    #[tokio::test]
    async fn test_complete_unknown_id_is_discarded() {
        let pending = PendingRequests::new();
        let reply = Message::new(codes::REQUEST_COMPLETED, 99);
        assert!(!pending.complete(reply).await);
    }

    #[tokio::test]
    async fn test_cancel_removes_entry() {
        let pending = PendingRequests::new();
        let rx = pending.register(7).await;
        assert!(pending.cancel(7).await);
        assert!(!pending.cancel(7).await);

        // A late reply has no observable effect.
        let reply = Message::new(codes::REQUEST_COMPLETED, 7);
        assert!(!pending.complete(reply).await);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_multipart_accumulation() {
        let pending = PendingRequests::new();
        let rx = pending.register(5).await;

        let mut first = Message::new(codes::REQUEST_COMPLETED, 5);
        first.set_flag(flags::MORE_FOLLOWS);
        first.set_id_list(fields::CHILD_LIST, &[1, 2]);
        assert!(pending.complete(first).await);
        // Intermediate chunks never resolve the caller.
        assert_eq!(pending.len().await, 1);

        let mut second = Message::new(codes::REQUEST_COMPLETED, 5);
        second.set_flag(flags::MORE_FOLLOWS);
        second.set_id_list(fields::CHILD_LIST, &[3]);
        assert!(pending.complete(second).await);

        let mut last = Message::new(codes::REQUEST_COMPLETED, 5);
        last.set_id_list(fields::CHILD_LIST, &[4]);
        last.set_u32(fields::RESULT_CODE, 0);
        assert!(pending.complete(last).await);

        let result = rx.await.unwrap().unwrap();
        assert_eq!(
            result.get_id_list(fields::CHILD_LIST),
            Some(vec![1, 2, 3, 4])
        );
        assert!(!result.has_more());
        assert!(pending.is_empty().await);
    }

    #[tokio::test]
    async fn test_fail_all_resolves_everything() {
        let pending = PendingRequests::new();
        let rx1 = pending.register(1).await;
        let rx2 = pending.register(2).await;
        let rx3 = pending.register(3).await;

        pending.fail_all().await;
        assert!(pending.is_empty().await);

        for rx in [rx1, rx2, rx3] {
            let result = rx.await.unwrap();
            assert!(matches!(result, Err(RequestError::Closed)));
        }
    }
}
