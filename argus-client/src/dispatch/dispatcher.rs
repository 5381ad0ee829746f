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

//! The request dispatcher: send, correlate, resolve.

use super::correlation::RequestIdGenerator;
use super::error::RequestError;
use super::pending::PendingRequests;
use crate::protocol::Message;
use crate::transport::{Connection, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Correlates outgoing requests with incoming replies.
///
/// Every request gets a fresh id from the shared generator, a pending
/// entry, and a trip through the connection's serialized write path.
/// The session's receive task feeds replies back into the pending table;
/// concurrent callers each receive exactly the reply matching their own
/// id, regardless of arrival order.
#[derive(Debug)]
pub struct RequestDispatcher {
    ids: RequestIdGenerator,
    pending: Arc<PendingRequests>,
    connection: Arc<Connection>,
    default_timeout: Duration,
}

impl RequestDispatcher {
    /// Creates a dispatcher bound to a connection.
    pub(crate) fn new(connection: Arc<Connection>, default_timeout: Duration) -> Self {
        Self {
            ids: RequestIdGenerator::new(),
            pending: Arc::new(PendingRequests::new()),
            connection,
            default_timeout,
        }
    }

    /// Sends a request and waits for the matching reply, using the
    /// session's default timeout.
    ///
    /// # Errors
    ///
    /// See [`RequestDispatcher::request_timeout`].
    pub async fn request(&self, message: Message) -> Result<Message, RequestError> {
        self.request_timeout(message, self.default_timeout).await
    }

    /// Sends a request and waits for the matching reply.
    ///
    /// Multi-part replies are accumulated internally; the returned
    /// message is always the completed result.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Timeout`] if no final reply arrives within
    ///   `timeout`; the pending entry is removed and a late reply is
    ///   discarded silently
    /// - [`RequestError::Closed`] if the channel closes while waiting
    /// - [`RequestError::Transport`] if the request cannot be sent
    pub async fn request_timeout(
        &self,
        message: Message,
        timeout: Duration,
    ) -> Result<Message, RequestError> {
        let handle = self.submit(message).await?;
        let request_id = handle.request_id();

        match tokio::time::timeout(timeout, handle.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RequestError::Closed),
            Err(_) => {
                self.pending.cancel(request_id).await;
                debug!(request_id, ?timeout, "request timed out");
                Err(RequestError::Timeout { timeout })
            }
        }
    }

    /// Sends a request and returns a handle to await the reply later.
    ///
    /// The handle can be cancelled, which frees the pending entry but
    /// cannot un-send the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Closed`] or [`RequestError::Transport`]
    /// if the request cannot be transmitted.
    pub async fn submit(&self, mut message: Message) -> Result<RequestHandle, RequestError> {
        let request_id = self.ids.next();
        message.set_request_id(request_id);

        let rx = self.pending.register(request_id).await;
        if let Err(e) = self.connection.send(message).await {
            self.pending.cancel(request_id).await;
            return Err(match e {
                TransportError::Closed => RequestError::Closed,
                other => RequestError::Transport(other),
            });
        }

        Ok(RequestHandle {
            request_id,
            rx,
            pending: Arc::clone(&self.pending),
        })
    }

    /// Routes one incoming reply to its waiting caller.
    ///
    /// Called from the session's receive task only. A reply whose id has
    /// no pending entry (the caller timed out or cancelled) is logged and
    /// discarded; nobody is waiting for it.
    pub(crate) async fn dispatch_reply(&self, reply: Message) {
        let request_id = reply.request_id();
        if !self.pending.complete(reply).await {
            debug!(request_id, "discarding reply with no waiting caller");
        }
    }

    /// Resolves every in-flight request with [`RequestError::Closed`].
    ///
    /// Called once during session teardown.
    pub(crate) async fn fail_all(&self) {
        self.pending.fail_all().await;
    }

    /// Returns the number of in-flight requests.
    pub async fn pending_count(&self) -> usize {
        self.pending.len().await
    }
}

/// An awaitable handle for an asynchronously submitted request.
#[derive(Debug)]
pub struct RequestHandle {
    request_id: u64,
    rx: oneshot::Receiver<Result<Message, RequestError>>,
    pending: Arc<PendingRequests>,
}

impl RequestHandle {
    /// Returns the request id assigned to this request.
    #[must_use]
    pub const fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Waits for the reply.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Closed`] if the channel closed before a
    /// reply arrived.
    pub async fn wait(self) -> Result<Message, RequestError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Closed),
        }
    }

    /// Cancels the request, freeing its pending entry.
    ///
    /// The server may still process the request; the client simply stops
    /// waiting. Returns `true` if the request was still pending.
    pub async fn cancel(self) -> bool {
        self.pending.cancel(self.request_id).await
    }
}
