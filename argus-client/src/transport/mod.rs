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

//! Transport layer: socket lifecycle, preamble negotiation, and TLS.
//!
//! The transport owns exactly one TCP (or TLS-over-TCP) connection per
//! session. Its lifecycle is connect once, run until failure or an
//! explicit close, never reconnect. Key properties:
//!
//! - **Negotiation first**: a fixed preamble is exchanged before any
//!   application message; transport encryption is agreed there, and a
//!   refusal surfaces as [`TransportError::EncryptionUnavailable`]
//!   rather than a silent plaintext fallback.
//! - **Serialized writes**: all sends funnel through one writer task, so
//!   concurrent callers can never interleave frames on the wire.
//! - **Idempotent close**: closing wakes every blocked sender and
//!   receiver with [`TransportError::Closed`] instead of hanging.

pub mod connection;
pub mod error;
pub mod preamble;
pub mod tls;

pub use connection::{Connection, MessageReader};
pub use error::TransportError;
pub use preamble::{OPT_TLS, PREAMBLE_MAGIC, PREAMBLE_SIZE, PREAMBLE_VERSION};
pub use tls::{EncryptionMode, TlsOptions};
