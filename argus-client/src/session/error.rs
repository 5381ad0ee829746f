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

//! Login flow error types.

use super::config::SignatureError;
use crate::dispatch::RequestError;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the login flow.
///
/// Authentication outcomes are deliberately distinct, not collapsed: a
/// caller reacts differently to a denied credential, an expired password
/// (which is a non-fatal status, not an error), and an incompatible
/// protocol version.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport connection could not be established.
    ///
    /// [`TransportError::EncryptionUnavailable`] arrives through this
    /// variant; see [`SessionError::is_encryption_unavailable`].
    #[error("connection failed: {0}")]
    Connection(#[from] TransportError),

    /// The server rejected the credentials.
    #[error("access denied by server")]
    AccessDenied,

    /// Client and server protocol versions are incompatible.
    ///
    /// Fatal unless the caller configured
    /// [`ignore_protocol_version`](crate::session::SessionConfig::ignore_protocol_version).
    #[error("server protocol version {server} is incompatible with client version {client}")]
    ProtocolVersionMismatch {
        /// Version reported by the server.
        server: u32,
        /// Version spoken by this client.
        client: u32,
    },

    /// The server rejected the login with an unexpected result code.
    #[error("login rejected with result code {code}")]
    LoginFailed {
        /// The protocol result code.
        code: u32,
    },

    /// The server replied with a message this client cannot use.
    #[error("unexpected server reply: {reason}")]
    UnexpectedReply {
        /// Description of what was missing or wrong.
        reason: String,
    },

    /// The authentication challenge could not be signed.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// A request underlying the login flow failed.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl SessionError {
    /// Returns `true` if this error is an authentication outcome
    /// (denied credentials, bad login, version mismatch) rather than a
    /// transport or request failure.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied | Self::LoginFailed { .. } | Self::ProtocolVersionMismatch { .. }
        )
    }

    /// Returns `true` if the server refused transport encryption.
    ///
    /// Retrying with [`EncryptionMode::Disabled`] is the caller's call;
    /// the session never falls back automatically.
    ///
    /// [`EncryptionMode::Disabled`]: crate::transport::EncryptionMode::Disabled
    #[must_use]
    pub const fn is_encryption_unavailable(&self) -> bool {
        matches!(self, Self::Connection(TransportError::EncryptionUnavailable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_classification() {
        assert!(SessionError::AccessDenied.is_authentication());
        assert!(SessionError::LoginFailed { code: 9 }.is_authentication());
        assert!(
            SessionError::ProtocolVersionMismatch {
                server: 9,
                client: 4
            }
            .is_authentication()
        );
        assert!(!SessionError::Connection(TransportError::Closed).is_authentication());
    }

    #[test]
    fn test_encryption_unavailable_detection() {
        let err = SessionError::Connection(TransportError::EncryptionUnavailable);
        assert!(err.is_encryption_unavailable());
        assert!(!err.is_authentication());

        let err = SessionError::Connection(TransportError::Closed);
        assert!(!err.is_encryption_unavailable());
    }
}
