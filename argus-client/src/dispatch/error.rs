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

//! Request layer error types.
//!
//! These errors are delivered only to the specific waiting caller, never
//! broadcast.

use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can resolve an in-flight request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No reply arrived within the request's timeout.
    ///
    /// The pending entry has been removed; a late reply is discarded
    /// silently. Retrying is safe for idempotent requests.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The channel closed before a reply arrived.
    ///
    /// All pending requests resolve with this error in one sweep when
    /// the session's channel goes down; nothing waits past channel
    /// lifetime.
    #[error("channel closed before a reply arrived")]
    Closed,

    /// The request was cancelled by the caller.
    ///
    /// The server may still process the request; the client just stops
    /// waiting.
    #[error("request cancelled")]
    Cancelled,

    /// The server rejected the request with a result code.
    #[error("server returned result code {code}")]
    ServerFailure {
        /// The protocol result code (see [`crate::protocol::rcc`]).
        code: u32,
    },

    /// The request could not be transmitted.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl RequestError {
    /// Returns `true` if retrying the request on the same session can
    /// succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_is_retryable() {
        let timeout = RequestError::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert!(timeout.is_retryable());
        assert!(!RequestError::Closed.is_retryable());
        assert!(!RequestError::Cancelled.is_retryable());
        assert!(!RequestError::ServerFailure { code: 5 }.is_retryable());
    }
}
