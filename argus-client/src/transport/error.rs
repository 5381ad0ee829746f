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

//! Transport layer error types.
//!
//! Transport errors are connection-level failures: they affect the whole
//! channel, not a single frame or request. A session that sees a
//! non-recoverable transport error tears down.

use std::io;
use thiserror::Error;

/// Errors that can occur in the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the server.
    ///
    /// Retrying is the caller's decision; the session itself never
    /// reconnects.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The server refused transport encryption.
    ///
    /// Surfaced distinctly so the caller can decide whether to retry
    /// without encryption; the fallback is never automatic.
    #[error("server does not support transport encryption")]
    EncryptionUnavailable,

    /// The connection preamble exchange failed.
    ///
    /// The peer is not an Argus server, or speaks an incompatible
    /// transport framing version.
    #[error("connection negotiation failed: {reason}")]
    NegotiationFailed {
        /// Description of the negotiation failure.
        reason: String,
    },

    /// The TLS handshake failed after the server accepted encryption.
    #[error("TLS handshake failed: {source}")]
    TlsFailed {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The TLS configuration could not be built.
    #[error("invalid TLS configuration: {reason}")]
    InvalidTlsConfiguration {
        /// Description of the configuration error.
        reason: String,
    },

    /// The channel is closed.
    ///
    /// Returned to senders after [`close`](crate::transport::Connection::close)
    /// or after the peer disconnected; blocked operations are woken with
    /// this error rather than hanging.
    #[error("channel is closed")]
    Closed,

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Returns `true` if the operation may succeed when retried by the
    /// caller (with a fresh connection where applicable).
    ///
    /// [`TransportError::EncryptionUnavailable`] is deliberately not
    /// recoverable: retrying without encryption changes the security
    /// posture and must be an explicit caller decision.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::EncryptionUnavailable
            | Self::NegotiationFailed { .. }
            | Self::TlsFailed { .. }
            | Self::InvalidTlsConfiguration { .. }
            | Self::Closed => false,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}
