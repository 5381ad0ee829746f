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

//! Event layer: delivery of server pushes to subscribers.
//!
//! Unsolicited server messages (object changes, data-collection values,
//! alarms, notifications) are decoded into typed [`SessionEvent`]s and
//! fanned out to [`Subscription`]s by category. Delivery properties:
//!
//! - **Per-source ordering**: events from the same logical source reach a
//!   given subscriber in receipt order; nothing is guaranteed across
//!   sources.
//! - **Bounded queues**: each subscriber owns a bounded queue; on
//!   overflow the oldest event is dropped and counted
//!   ([`Subscription::dropped`]), never blocking the receive loop.
//! - **Failure isolation**: subscribers only pull from their own queues,
//!   so one stalled or failed subscriber cannot affect the others.

mod queue;
pub mod router;
pub mod types;

pub use router::{EventRouter, Subscription};
pub use types::{Alarm, AlarmState, EventCategory, MetricUpdate, SessionEvent, Severity};
