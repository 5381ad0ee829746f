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

//! Dispatch layer: request/reply correlation.
//!
//! Outgoing requests receive a fresh correlation id and a pending entry;
//! the session's receive task resolves entries as replies arrive. The
//! layer guarantees:
//!
//! - each caller receives exactly the reply matching its own request id,
//!   however replies are ordered on the wire
//! - multi-part replies (flagged "more follows") are accumulated and
//!   delivered as one completed message
//! - a timed-out or cancelled request's entry is removed, and a late
//!   reply for it is discarded silently
//! - channel closure resolves every pending request with
//!   [`RequestError::Closed`] in a single sweep

pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod pending;

pub use correlation::RequestIdGenerator;
pub use dispatcher::{RequestDispatcher, RequestHandle};
pub use error::RequestError;
pub use pending::PendingRequests;
