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

//! Top-level error type composing the layer hierarchy.
//!
//! The engine keeps its error layers separate — transport failures close
//! channels, protocol failures drop frames, request failures reach one
//! caller, session failures end the login flow — but callers that funnel
//! everything into one `Result` can use [`ClientError`] and the `From`
//! conversions each layer provides.

use crate::dispatch::RequestError;
use crate::protocol::ProtocolError;
use crate::session::SessionError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level error for Argus client operations.
#[derive(Debug)]
pub enum ClientError {
    /// A transport-layer error: the whole channel is affected.
    Transport(TransportError),
    /// A protocol-layer error: one frame was malformed.
    Protocol(ProtocolError),
    /// A request-layer error: one caller's request failed.
    Request(RequestError),
    /// A session-layer error from the login flow.
    Session(SessionError),
}

impl ClientError {
    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a protocol error.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns `true` if this is a request error.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Returns `true` if this is a session error.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns `true` if retrying the operation can succeed.
    ///
    /// Transport retries imply a fresh connection; request retries stay
    /// on the same session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Protocol(e) => e.is_frame_local(),
            Self::Request(e) => e.is_retryable(),
            Self::Session(e) => match e {
                SessionError::Connection(transport) => transport.is_recoverable(),
                _ => false,
            },
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::Request(e) => write!(f, "request error: {e}"),
            Self::Session(e) => write!(f, "session error: {e}"),
        }
    }
}

impl StdError for ClientError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Request(e) => Some(e),
            Self::Session(e) => Some(e),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

impl From<RequestError> for ClientError {
    fn from(error: RequestError) -> Self {
        Self::Request(error)
    }
}

impl From<SessionError> for ClientError {
    fn from(error: SessionError) -> Self {
        Self::Session(error)
    }
}
