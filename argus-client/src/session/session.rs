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

//! The session controller.
//!
//! A [`Session`] owns one connection, one request dispatcher, one event
//! router, and one object cache; all of them are torn down with it. The
//! session's receive task is the single consumer of incoming messages:
//! replies resolve pending requests, pushes fan out to subscribers, and
//! object-graph pushes are additionally applied to the cache. That task
//! is the sole writer into both the pending table and the cache.

use super::config::{Credentials, SessionConfig};
use super::error::SessionError;
use super::state::SessionState;
use crate::dispatch::{RequestDispatcher, RequestError, RequestHandle};
use crate::events::{Alarm, EventCategory, EventRouter, MetricUpdate, SessionEvent, Subscription};
use crate::objects::{NetObject, ObjectCache};
use crate::protocol::{Message, PROTOCOL_VERSION, codes, fields, rcc};
use crate::transport::{Connection, MessageReader};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

// Authentication method discriminators.
const AUTH_PASSWORD: u32 = 0;
const AUTH_CERTIFICATE: u32 = 1;

/// An authenticated session with an Argus server.
///
/// Cloning is cheap and shares the same underlying session; consumers
/// are expected to pass a session handle around explicitly rather than
/// stashing it in a global.
///
/// Created by [`Session::connect`]; gone for good after
/// [`Session::disconnect`] or an unrecoverable channel error. No pending
/// request or subscription survives the session: teardown resolves every
/// in-flight request with [`RequestError::Closed`] and closes every
/// subscription queue.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    connection: Arc<Connection>,
    dispatcher: RequestDispatcher,
    router: Arc<EventRouter>,
    cache: ObjectCache,
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,
    password_expired: AtomicBool,
    server_version: OnceLock<String>,
    server_id: OnceLock<Uuid>,
    last_activity: Mutex<Instant>,
    receive_task: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
}

impl Session {
    /// Connects, authenticates, and synchronizes the initial object
    /// snapshot.
    ///
    /// On success the session is in the `Ready` state and early API
    /// calls observe a consistent object snapshot. An expired password
    /// is not an error: the session still becomes `Ready` and
    /// [`Session::password_expired`] reports the condition so a
    /// password-change flow can run.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Connection`] for transport failures, including
    ///   the distinct encryption-refused case
    /// - [`SessionError::AccessDenied`] for rejected credentials
    /// - [`SessionError::ProtocolVersionMismatch`] unless the version
    ///   check was disabled
    /// - [`SessionError::Request`] if the server stops responding during
    ///   login or synchronization
    pub async fn connect(config: SessionConfig) -> Result<Self, SessionError> {
        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);
        info!(address = config.address(), "connecting to server");

        let (connection, reader) =
            Connection::connect(config.address(), config.encryption()).await?;
        let connection = Arc::new(connection);
        let dispatcher =
            RequestDispatcher::new(Arc::clone(&connection), config.request_timeout());
        let router = Arc::new(EventRouter::new(config.event_queue_capacity()));

        let inner = Arc::new(SessionInner {
            connection,
            dispatcher,
            router,
            cache: ObjectCache::new(),
            state_tx,
            state_rx,
            password_expired: AtomicBool::new(false),
            server_version: OnceLock::new(),
            server_id: OnceLock::new(),
            last_activity: Mutex::new(Instant::now()),
            receive_task: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        });

        // The receive task must already pump replies while login runs.
        let task = tokio::spawn(receive_loop(Arc::clone(&inner), reader));
        *inner.receive_task.lock() = Some(task);

        let session = Self { inner };
        if let Err(e) = session.login(&config).await {
            session.disconnect().await;
            return Err(e);
        }

        session
            .inner
            .state_tx
            .send_replace(SessionState::Synchronizing);
        if config.syncs_objects() {
            if let Err(e) = session.synchronize_objects().await {
                session.disconnect().await;
                return Err(SessionError::Request(e));
            }
        }

        session.inner.state_tx.send_replace(SessionState::Ready);
        info!(
            server_version = session.server_version().unwrap_or("unknown"),
            objects = session.inner.cache.len(),
            "session ready"
        );
        Ok(session)
    }

    /// Runs the authentication exchange.
    async fn login(&self, config: &SessionConfig) -> Result<(), SessionError> {
        self.inner
            .state_tx
            .send_replace(SessionState::Authenticating);

        let mut login = Message::new(codes::LOGIN, 0);
        login.set_u32(fields::PROTOCOL_VERSION, PROTOCOL_VERSION);
        login.set_string(fields::CLIENT_INFO, config.client_info());
        login.set_string(fields::LOGIN_NAME, config.credentials().login());

        match config.credentials() {
            Credentials::Password { password, .. } => {
                login.set_u32(fields::AUTH_METHOD, AUTH_PASSWORD);
                login.set_string(fields::PASSWORD, password.clone());
            }
            Credentials::Certificate { signer, .. } => {
                login.set_u32(fields::AUTH_METHOD, AUTH_CERTIFICATE);
                let reply = self
                    .inner
                    .dispatcher
                    .request(Message::new(codes::GET_CHALLENGE, 0))
                    .await?;
                let challenge = reply.get_binary(fields::CHALLENGE).ok_or_else(|| {
                    SessionError::UnexpectedReply {
                        reason: "challenge reply carries no challenge".to_string(),
                    }
                })?;
                login.set_binary(fields::SIGNATURE, signer.sign(challenge)?);
                login.set_binary(fields::CERTIFICATE, signer.certificate().to_vec());
            }
        }

        let reply = self.inner.dispatcher.request(login).await?;
        let code = reply
            .get_u32(fields::RESULT_CODE)
            .unwrap_or(rcc::INTERNAL_ERROR);
        let server_version = reply.get_u32(fields::PROTOCOL_VERSION).unwrap_or(0);

        match code {
            rcc::SUCCESS | rcc::PASSWORD_EXPIRED => {
                if server_version != PROTOCOL_VERSION && !config.ignores_protocol_version() {
                    return Err(SessionError::ProtocolVersionMismatch {
                        server: server_version,
                        client: PROTOCOL_VERSION,
                    });
                }
                if code == rcc::PASSWORD_EXPIRED {
                    warn!("server reports an expired password");
                    self.inner.password_expired.store(true, Ordering::Release);
                }
                if let Some(version) = reply.get_string(fields::SERVER_VERSION) {
                    let _ = self.inner.server_version.set(version);
                }
                if let Some(id) = reply.get_uuid(fields::SERVER_ID) {
                    let _ = self.inner.server_id.set(id);
                }
                Ok(())
            }
            rcc::ACCESS_DENIED => Err(SessionError::AccessDenied),
            rcc::VERSION_MISMATCH => Err(SessionError::ProtocolVersionMismatch {
                server: server_version,
                client: PROTOCOL_VERSION,
            }),
            other => Err(SessionError::LoginFailed { code: other }),
        }
    }

    /// Pulls the initial object set into the cache.
    ///
    /// Objects arrive as pushes applied by the receive task; the request
    /// resolves once the server signals the end of the download.
    async fn synchronize_objects(&self) -> Result<(), RequestError> {
        let reply = self
            .inner
            .dispatcher
            .request(Message::new(codes::GET_OBJECTS, 0))
            .await?;
        check_result(&reply)?;
        debug!(
            objects = self.inner.cache.len(),
            "initial object synchronization complete"
        );
        Ok(())
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state_rx.borrow()
    }

    /// Returns a watcher for state transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_rx.clone()
    }

    /// Returns `true` while the session has not reached its terminal
    /// state.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.state().is_terminal()
    }

    /// Sends a request and waits for the matching reply, using the
    /// session's default timeout.
    ///
    /// # Errors
    ///
    /// See [`RequestDispatcher::request_timeout`].
    pub async fn request(&self, message: Message) -> Result<Message, RequestError> {
        self.inner.dispatcher.request(message).await
    }

    /// Sends a request and waits for the matching reply with an explicit
    /// timeout.
    ///
    /// # Errors
    ///
    /// See [`RequestDispatcher::request_timeout`].
    pub async fn request_timeout(
        &self,
        message: Message,
        timeout: Duration,
    ) -> Result<Message, RequestError> {
        self.inner.dispatcher.request_timeout(message, timeout).await
    }

    /// Sends a request and returns an awaitable, cancellable handle.
    ///
    /// # Errors
    ///
    /// See [`RequestDispatcher::submit`].
    pub async fn submit(&self, message: Message) -> Result<RequestHandle, RequestError> {
        self.inner.dispatcher.submit(message).await
    }

    /// Returns the number of in-flight requests.
    pub async fn pending_count(&self) -> usize {
        self.inner.dispatcher.pending_count().await
    }

    /// Subscribes to a category of server pushes.
    ///
    /// The subscription ends when it is dropped, explicitly
    /// unsubscribed, or the session tears down.
    #[must_use]
    pub fn subscribe(&self, category: EventCategory) -> Subscription {
        EventRouter::subscribe(&self.inner.router, category)
    }

    /// Looks up a cached object by id.
    #[must_use]
    pub fn object(&self, id: u64) -> Option<Arc<NetObject>> {
        self.inner.cache.get(id)
    }

    /// Returns a snapshot of all cached objects.
    #[must_use]
    pub fn objects(&self) -> Vec<Arc<NetObject>> {
        self.inner.cache.all()
    }

    /// Returns `true` if the server reported the password as expired at
    /// login.
    #[must_use]
    pub fn password_expired(&self) -> bool {
        self.inner.password_expired.load(Ordering::Acquire)
    }

    /// Changes the account password.
    ///
    /// Clears the expired-password status on success; pairs with the
    /// `PasswordExpired` login outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ServerFailure`] if the server rejects the
    /// change.
    pub async fn change_password(&self, new_password: &str) -> Result<(), RequestError> {
        let mut msg = Message::new(codes::CHANGE_PASSWORD, 0);
        msg.set_string(fields::NEW_PASSWORD, new_password);
        let reply = self.inner.dispatcher.request(msg).await?;
        check_result(&reply)?;
        self.inner.password_expired.store(false, Ordering::Release);
        Ok(())
    }

    /// Returns the server software version reported at login.
    #[must_use]
    pub fn server_version(&self) -> Option<&str> {
        self.inner.server_version.get().map(String::as_str)
    }

    /// Returns the server instance id reported at login.
    #[must_use]
    pub fn server_id(&self) -> Option<Uuid> {
        self.inner.server_id.get().copied()
    }

    /// Returns `true` if the connection is TLS-encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.inner.connection.is_encrypted()
    }

    /// Returns the instant of the last server activity (any received
    /// message, including keepalives).
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        *self.inner.last_activity.lock()
    }

    /// Disconnects and tears the session down.
    ///
    /// Idempotent. Every pending request resolves with
    /// [`RequestError::Closed`], every subscription queue closes, the
    /// cache is dropped, and the state becomes terminal `Disconnected`.
    pub async fn disconnect(&self) {
        self.inner.teardown().await;
        if let Some(task) = self.inner.receive_task.lock().take() {
            task.abort();
        }
    }
}

impl SessionInner {
    /// Routes one incoming message on the receive task.
    async fn route(&self, message: Message) {
        *self.last_activity.lock() = Instant::now();
        match message.code() {
            codes::KEEPALIVE => {}
            codes::OBJECT | codes::OBJECT_UPDATE => {
                if let Some(object) = self.cache.apply_update(&message) {
                    self.router.dispatch(&SessionEvent::ObjectChanged(object));
                }
            }
            codes::OBJECT_DELETED => match message.get_u64(fields::OBJECT_ID) {
                Some(id) => {
                    self.cache.apply_delete(id);
                    self.router.dispatch(&SessionEvent::ObjectRemoved(id));
                }
                None => warn!("dropping object deletion without an object id"),
            },
            codes::METRIC_DATA => match MetricUpdate::from_message(&message) {
                Some(update) => self.router.dispatch(&SessionEvent::MetricUpdate(update)),
                None => warn!("dropping metric update with missing fields"),
            },
            codes::ALARM_UPDATE => match Alarm::from_message(&message) {
                Some(alarm) => self.router.dispatch(&SessionEvent::AlarmChanged(alarm)),
                None => warn!("dropping alarm update with missing fields"),
            },
            codes::NOTIFY => {
                let code = message.get_u32(fields::NOTIFY_CODE).unwrap_or(0);
                let data = message.get_u64(fields::NOTIFY_DATA).unwrap_or(0);
                self.router
                    .dispatch(&SessionEvent::Notification { code, data });
            }
            _ => self.dispatcher.dispatch_reply(message).await,
        }
    }

    /// Tears down every owned component. Idempotent.
    async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("tearing down session");
        self.state_tx.send_replace(SessionState::Disconnected);
        self.connection.close();
        self.dispatcher.fail_all().await;
        self.router.close();
        self.cache.clear();
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(task) = self.receive_task.lock().take() {
            task.abort();
        }
    }
}

/// The per-session receive task: pumps the reader until the channel
/// closes, then tears the session down.
async fn receive_loop(inner: Arc<SessionInner>, mut reader: MessageReader) {
    loop {
        match reader.next().await {
            Ok(Some(message)) => inner.route(message).await,
            Ok(None) => break,
            // Frame-local decode error: drop the frame, keep receiving.
            Err(e) => warn!(error = %e, "dropping malformed frame"),
        }
    }
    debug!("receive loop ended");
    inner.teardown().await;
}

/// Maps a reply's result code to an error for non-success codes.
fn check_result(reply: &Message) -> Result<(), RequestError> {
    match reply.get_u32(fields::RESULT_CODE) {
        Some(rcc::SUCCESS) | None => Ok(()),
        Some(code) => Err(RequestError::ServerFailure { code }),
    }
}
