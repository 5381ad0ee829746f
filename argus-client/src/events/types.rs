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

//! Typed session events and their categories.

use crate::objects::NetObject;
use crate::protocol::{Message, fields};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Categories a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Object graph changes (creates, updates, deletions).
    Objects,
    /// New data-collection values.
    DataCollection,
    /// Alarm lifecycle notifications.
    Alarms,
    /// Generic server notifications.
    System,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Objects => "objects",
            Self::DataCollection => "data-collection",
            Self::Alarms => "alarms",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// A server push delivered to subscribers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// An object was created or updated; carries the post-merge snapshot.
    ObjectChanged(Arc<NetObject>),
    /// An object was deleted.
    ObjectRemoved(u64),
    /// A new data-collection value arrived.
    MetricUpdate(MetricUpdate),
    /// An alarm was created or changed state.
    AlarmChanged(Alarm),
    /// A generic server notification.
    Notification {
        /// Notification code.
        code: u32,
        /// Notification payload.
        data: u64,
    },
}

impl SessionEvent {
    /// Returns the category this event is delivered on.
    #[must_use]
    pub const fn category(&self) -> EventCategory {
        match self {
            Self::ObjectChanged(_) | Self::ObjectRemoved(_) => EventCategory::Objects,
            Self::MetricUpdate(_) => EventCategory::DataCollection,
            Self::AlarmChanged(_) => EventCategory::Alarms,
            Self::Notification { .. } => EventCategory::System,
        }
    }
}

/// A new value for a monitored metric (data collection item).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricUpdate {
    /// Id of the node the metric belongs to.
    pub node_id: u64,
    /// Id of the metric.
    pub metric_id: u64,
    /// Collection timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// Collected value, rendered as text.
    pub value: String,
}

impl MetricUpdate {
    /// Decodes a metric update from a push message.
    ///
    /// Returns `None` if the mandatory fields are missing; the caller
    /// logs and drops such pushes.
    #[must_use]
    pub(crate) fn from_message(msg: &Message) -> Option<Self> {
        Some(Self {
            node_id: msg.get_u64(fields::METRIC_NODE)?,
            metric_id: msg.get_u64(fields::METRIC_ID)?,
            timestamp: msg.get_timestamp(fields::METRIC_TIMESTAMP),
            value: msg.get_string(fields::METRIC_VALUE).unwrap_or_default(),
        })
    }
}

/// Alarm severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational.
    Normal,
    /// Warning.
    Warning,
    /// Minor problem.
    Minor,
    /// Major problem.
    Major,
    /// Critical problem.
    Critical,
}

impl Severity {
    /// Maps a raw protocol value; unknown values clamp to `Normal`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Warning,
            2 => Self::Minor,
            3 => Self::Major,
            4 => Self::Critical,
            _ => Self::Normal,
        }
    }
}

/// Alarm lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    /// Raised and not yet acknowledged.
    Outstanding,
    /// Acknowledged by an operator.
    Acknowledged,
    /// Resolved but not yet terminated.
    Resolved,
    /// Terminated.
    Terminated,
}

impl AlarmState {
    /// Maps a raw protocol value; unknown values clamp to `Outstanding`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Acknowledged,
            2 => Self::Resolved,
            3 => Self::Terminated,
            _ => Self::Outstanding,
        }
    }
}

/// An alarm raised on a managed object.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    /// Alarm id.
    pub id: u64,
    /// Id of the object the alarm originates from.
    pub source_object: u64,
    /// Severity.
    pub severity: Severity,
    /// Lifecycle state.
    pub state: AlarmState,
    /// Message text.
    pub message: String,
    /// Creation time.
    pub created: Option<DateTime<Utc>>,
    /// Time of the last state change.
    pub last_changed: Option<DateTime<Utc>>,
}

impl Alarm {
    /// Decodes an alarm from a push message.
    ///
    /// Returns `None` if the mandatory fields are missing; the caller
    /// logs and drops such pushes.
    #[must_use]
    pub(crate) fn from_message(msg: &Message) -> Option<Self> {
        Some(Self {
            id: msg.get_u64(fields::ALARM_ID)?,
            source_object: msg.get_u64(fields::ALARM_SOURCE)?,
            severity: Severity::from_raw(msg.get_u32(fields::ALARM_SEVERITY).unwrap_or(0)),
            state: AlarmState::from_raw(msg.get_u32(fields::ALARM_STATE).unwrap_or(0)),
            message: msg.get_string(fields::ALARM_MESSAGE).unwrap_or_default(),
            created: msg.get_timestamp(fields::ALARM_CREATED),
            last_changed: msg.get_timestamp(fields::ALARM_CHANGED),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codes;

    #[test]
    fn test_event_categories() {
        assert_eq!(
            SessionEvent::ObjectRemoved(1).category(),
            EventCategory::Objects
        );
        assert_eq!(
            SessionEvent::Notification { code: 1, data: 2 }.category(),
            EventCategory::System
        );
    }

    #[test]
    fn test_metric_update_decoding() {
        let mut msg = Message::new(codes::METRIC_DATA, 0);
        msg.set_u64(fields::METRIC_NODE, 10);
        msg.set_u64(fields::METRIC_ID, 400);
        msg.set_string(fields::METRIC_VALUE, "23.5");

        let update = MetricUpdate::from_message(&msg).unwrap();
        assert_eq!(update.node_id, 10);
        assert_eq!(update.metric_id, 400);
        assert_eq!(update.value, "23.5");
        assert_eq!(update.timestamp, None);
    }

    #[test]
    fn test_metric_update_requires_ids() {
        let mut msg = Message::new(codes::METRIC_DATA, 0);
        msg.set_string(fields::METRIC_VALUE, "23.5");
        assert!(MetricUpdate::from_message(&msg).is_none());
    }

    #[test]
    fn test_alarm_decoding() {
        let mut msg = Message::new(codes::ALARM_UPDATE, 0);
        msg.set_u64(fields::ALARM_ID, 77);
        msg.set_u64(fields::ALARM_SOURCE, 42);
        msg.set_u32(fields::ALARM_SEVERITY, 4);
        msg.set_u32(fields::ALARM_STATE, 1);
        msg.set_string(fields::ALARM_MESSAGE, "node down");

        let alarm = Alarm::from_message(&msg).unwrap();
        assert_eq!(alarm.id, 77);
        assert_eq!(alarm.severity, Severity::Critical);
        assert_eq!(alarm.state, AlarmState::Acknowledged);
        assert_eq!(alarm.message, "node down");
    }

    #[test]
    fn test_unknown_raw_values_clamp() {
        assert_eq!(Severity::from_raw(250), Severity::Normal);
        assert_eq!(AlarmState::from_raw(250), AlarmState::Outstanding);
    }
}
