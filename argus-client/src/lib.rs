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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Argus Client Session Engine
//!
//! This crate implements the client side of the Argus management protocol:
//! a persistent, authenticated session that exchanges tagged binary
//! messages with the server, correlates requests to replies, fans out
//! server-pushed notifications to subscribers, and keeps a locally cached
//! mirror of the server's object graph.
//!
//! ## Layers
//!
//! - **[`protocol`]**: message model, wire codec, fragment reassembly
//! - **[`transport`]**: TCP/TLS connection lifecycle and serialized writes
//! - **[`dispatch`]**: request id allocation and reply correlation
//! - **[`events`]**: category subscriptions and push delivery
//! - **[`objects`]**: the cached object model
//! - **[`session`]**: login state machine and the public API surface
//!
//! ## Threading Model
//!
//! Each session runs exactly one receive task that pumps incoming frames.
//! That task is the sole writer into the pending-request table and the
//! object cache; every other API call is safe from any number of
//! concurrent tasks. Outbound messages from concurrent callers are
//! serialized through a single writer task so frames never interleave on
//! the wire.
//!
//! ## Session Lifecycle
//!
//! A [`Session`] is created by [`Session::connect`] and moves through
//! `Connecting → Authenticating → Synchronizing → Ready`. Any
//! unrecoverable channel error tears the session down: every pending
//! request resolves with [`RequestError::Closed`], every subscription
//! queue closes, and the state becomes terminal `Disconnected`. Sessions
//! do not reconnect; callers create a fresh session instead.

pub mod dispatch;
pub mod error;
pub mod events;
pub mod objects;
pub mod protocol;
pub mod session;
pub mod transport;

pub use dispatch::{RequestError, RequestHandle};
pub use error::ClientError;
pub use events::{Alarm, AlarmState, EventCategory, MetricUpdate, SessionEvent, Severity, Subscription};
pub use objects::{NetObject, ObjectClass, ObjectStatus, SensorConfig};
pub use protocol::{FieldValue, Message, MessageCode};
pub use session::{
    ChallengeSigner, Credentials, Session, SessionConfig, SessionError, SessionState,
};
pub use transport::{EncryptionMode, TlsOptions, TransportError};
