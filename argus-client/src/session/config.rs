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

//! Session configuration.

use crate::transport::EncryptionMode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-subscriber event queue depth.
const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 256;

/// Signs server challenges for certificate authentication.
///
/// The engine never touches private key material: the signature is
/// produced by the caller's implementation (smart card, key store, or a
/// software key).
pub trait ChallengeSigner: Send + Sync {
    /// Returns the DER-encoded client certificate to present.
    fn certificate(&self) -> &[u8];

    /// Signs the server-issued challenge.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] if the signature cannot be produced.
    fn sign(&self, challenge: &[u8]) -> Result<Vec<u8>, SignatureError>;
}

/// Failure to sign an authentication challenge.
#[derive(Debug, Error)]
#[error("challenge signing failed: {reason}")]
pub struct SignatureError {
    reason: String,
}

impl SignatureError {
    /// Creates a signature error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Authentication credentials for a session.
#[derive(Clone)]
pub enum Credentials {
    /// Password authentication.
    Password {
        /// Login name.
        login: String,
        /// Password.
        password: String,
    },
    /// Certificate challenge/response authentication.
    Certificate {
        /// Login name.
        login: String,
        /// Signer producing the challenge response.
        signer: Arc<dyn ChallengeSigner>,
    },
}

impl Credentials {
    /// Creates password credentials.
    #[must_use]
    pub fn password(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Creates certificate credentials.
    #[must_use]
    pub fn certificate(login: impl Into<String>, signer: Arc<dyn ChallengeSigner>) -> Self {
        Self::Certificate {
            login: login.into(),
            signer,
        }
    }

    /// Returns the login name.
    #[must_use]
    pub fn login(&self) -> &str {
        match self {
            Self::Password { login, .. } | Self::Certificate { login, .. } => login,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { login, .. } => f
                .debug_struct("Credentials::Password")
                .field("login", login)
                .field("password", &"<redacted>")
                .finish(),
            Self::Certificate { login, .. } => f
                .debug_struct("Credentials::Certificate")
                .field("login", login)
                .finish(),
        }
    }
}

/// Configuration for establishing a session.
///
/// # Example
///
/// ```rust
/// use argus_client::{Credentials, SessionConfig, EncryptionMode, TlsOptions};
/// use std::time::Duration;
///
/// let config = SessionConfig::new(
///     "argus.example.com:4701",
///     Credentials::password("operator", "secret"),
/// )
/// .with_encryption(EncryptionMode::Enabled(TlsOptions::new()))
/// .with_request_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.address(), "argus.example.com:4701");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    address: String,
    credentials: Credentials,
    encryption: EncryptionMode,
    request_timeout: Duration,
    ignore_protocol_version: bool,
    sync_objects: bool,
    event_queue_capacity: usize,
    client_info: String,
}

impl SessionConfig {
    /// Creates a configuration for `address` (`host:port`) with the given
    /// credentials and defaults for everything else: plaintext transport,
    /// 30 second request timeout, protocol version checking on, initial
    /// object synchronization on.
    #[must_use]
    pub fn new(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            credentials,
            encryption: EncryptionMode::Disabled,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ignore_protocol_version: false,
            sync_objects: true,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            client_info: concat!("argus-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the transport encryption mode.
    #[must_use]
    pub fn with_encryption(mut self, encryption: EncryptionMode) -> Self {
        self.encryption = encryption;
        self
    }

    /// Sets the default per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disables the client-side protocol version check.
    ///
    /// A version mismatch then no longer fails the login; use only
    /// against servers known to be compatible.
    #[must_use]
    pub fn ignore_protocol_version(mut self) -> Self {
        self.ignore_protocol_version = true;
        self
    }

    /// Skips the initial bulk object synchronization.
    ///
    /// The cache then fills lazily from update pushes only.
    #[must_use]
    pub fn without_object_sync(mut self) -> Self {
        self.sync_objects = false;
        self
    }

    /// Sets the per-subscriber event queue depth.
    #[must_use]
    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    /// Sets the client identification string sent at login.
    #[must_use]
    pub fn with_client_info(mut self, client_info: impl Into<String>) -> Self {
        self.client_info = client_info.into();
        self
    }

    /// Returns the server address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the encryption mode.
    #[must_use]
    pub const fn encryption(&self) -> &EncryptionMode {
        &self.encryption
    }

    /// Returns the default request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns `true` if the protocol version check is disabled.
    #[must_use]
    pub const fn ignores_protocol_version(&self) -> bool {
        self.ignore_protocol_version
    }

    /// Returns `true` if the initial object synchronization runs.
    #[must_use]
    pub const fn syncs_objects(&self) -> bool {
        self.sync_objects
    }

    /// Returns the per-subscriber event queue depth.
    #[must_use]
    pub const fn event_queue_capacity(&self) -> usize {
        self.event_queue_capacity
    }

    /// Returns the client identification string.
    #[must_use]
    pub fn client_info(&self) -> &str {
        &self.client_info
    }
}
