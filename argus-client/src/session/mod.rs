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

//! Session layer: the login state machine and the public API surface.
//!
//! This is the layer every front-end consumes. A [`Session`] is created
//! with [`Session::connect`], which walks
//! `Connecting → Authenticating → Synchronizing → Ready` and hands back
//! a handle whose clones all share the one underlying session. The
//! session owns its transport channel, request dispatcher, event router,
//! and object cache; destroying the session destroys them all, so no
//! pending request or subscription can outlive it.

pub mod config;
pub mod error;
pub mod session;
pub mod state;

pub use config::{ChallengeSigner, Credentials, SessionConfig, SignatureError};
pub use error::SessionError;
pub use session::Session;
pub use state::SessionState;
