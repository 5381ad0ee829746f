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

//! Session lifecycle states.

use std::fmt;

/// The login state machine of a session.
///
/// States advance `Connecting → Authenticating → Synchronizing → Ready`.
/// Any unrecoverable channel error, from any state, transitions directly
/// to `Disconnected`, which is terminal: sessions never reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The transport connection is being established.
    Connecting,
    /// Credentials are being exchanged.
    Authenticating,
    /// The initial object snapshot is being downloaded.
    Synchronizing,
    /// The full API surface is available and pushes are flowing.
    Ready,
    /// Terminal: the session is gone and all owned components are down.
    Disconnected,
}

impl SessionState {
    /// Returns `true` once the session has terminated.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Synchronizing => "synchronizing",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}
