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

//! Protocol layer: message model and wire codec.
//!
//! Every exchange with an Argus server is a [`Message`]: a tagged, ordered
//! mapping from numeric field codes to typed values, together with a
//! message code (the message kind) and a request id (the correlation key
//! for request/reply matching; id `0` is reserved for spontaneous server
//! pushes).
//!
//! On the wire each message becomes one or more length-prefixed frames
//! with a fixed 24-byte header followed by self-describing field records.
//! Messages larger than [`codec::MAX_FRAME_SIZE`] are split into fragments
//! that the [`codec::Reassembler`] stitches back together, rejecting
//! out-of-order sequences and bounding the memory a misbehaving peer can
//! pin.
//!
//! # Frame Format
//!
//! ```text
//! +-----------+--------+---------+------------+----------+-------------+---------+
//! | Length(4) | Code(2)| Flags(2)| RequestId(8)| Seq(4)   | FieldCount(4)| Fields |
//! +-----------+--------+---------+------------+----------+-------------+---------+
//! ```
//!
//! All integers are big-endian. `Length` is the total frame size including
//! the header. Each field record is `code (u32) | type tag (u8) | value`,
//! where variable-width values carry an explicit `u32` byte length (strings
//! are *not* NUL-terminated, so embedded NUL bytes survive binary-safe
//! paths).

pub mod codec;
pub mod error;
pub mod message;
pub mod value;

pub use codec::{Frame, Reassembler, encode, write_message};
pub use error::ProtocolError;
pub use message::{Message, MessageCode};
pub use value::{FieldTable, FieldValue};

/// Protocol version spoken by this client.
///
/// Sent in the login request; the server's version comes back in the login
/// reply and a mismatch is fatal unless the caller opted out of the check.
pub const PROTOCOL_VERSION: u32 = 4;

/// Message codes (the `code` header field, one per message kind).
pub mod codes {
    use super::MessageCode;

    /// Client login request.
    pub const LOGIN: MessageCode = MessageCode::new(0x0001);
    /// Server reply to [`LOGIN`].
    pub const LOGIN_REPLY: MessageCode = MessageCode::new(0x0002);
    /// Generic request completion reply carrying a result code.
    pub const REQUEST_COMPLETED: MessageCode = MessageCode::new(0x0003);
    /// Request for a certificate-authentication challenge.
    pub const GET_CHALLENGE: MessageCode = MessageCode::new(0x0004);
    /// Password change request.
    pub const CHANGE_PASSWORD: MessageCode = MessageCode::new(0x0005);

    /// Bulk object download request (initial synchronization).
    pub const GET_OBJECTS: MessageCode = MessageCode::new(0x0010);
    /// Server push carrying one object during synchronization.
    pub const OBJECT: MessageCode = MessageCode::new(0x0011);
    /// Reply terminating a [`GET_OBJECTS`] download.
    pub const OBJECT_SYNC_DONE: MessageCode = MessageCode::new(0x0012);
    /// Server push carrying a partial object update.
    pub const OBJECT_UPDATE: MessageCode = MessageCode::new(0x0013);
    /// Server push announcing an object deletion.
    pub const OBJECT_DELETED: MessageCode = MessageCode::new(0x0014);

    /// Server push carrying a new data-collection value.
    pub const METRIC_DATA: MessageCode = MessageCode::new(0x0020);

    /// Server push carrying an alarm create/change notification.
    pub const ALARM_UPDATE: MessageCode = MessageCode::new(0x0030);

    /// Generic server notification.
    pub const NOTIFY: MessageCode = MessageCode::new(0x0040);
    /// Periodic server keepalive.
    pub const KEEPALIVE: MessageCode = MessageCode::new(0x0041);
}

/// Header flag bits.
pub mod flags {
    /// Frame is a fragment of a larger message.
    pub const FRAGMENT: u16 = 0x0001;
    /// Frame is the last fragment of a fragmented message.
    pub const LAST_FRAGMENT: u16 = 0x0002;
    /// More reply chunks follow for the same request id.
    pub const MORE_FOLLOWS: u16 = 0x0004;
}

/// Field codes used by the messages this client understands.
///
/// Field codes are scoped to the top-level field table of a message;
/// nested sub-blocks use their own small code spaces.
pub mod fields {
    /// Result code of a completed request (see [`crate::protocol::rcc`]).
    pub const RESULT_CODE: u32 = 1;
    /// Login name.
    pub const LOGIN_NAME: u32 = 2;
    /// Password (password authentication).
    pub const PASSWORD: u32 = 3;
    /// Authentication method discriminator.
    pub const AUTH_METHOD: u32 = 4;
    /// Server-issued challenge (certificate authentication).
    pub const CHALLENGE: u32 = 5;
    /// Signed challenge (certificate authentication).
    pub const SIGNATURE: u32 = 6;
    /// Client certificate (certificate authentication).
    pub const CERTIFICATE: u32 = 7;
    /// Free-form client identification string.
    pub const CLIENT_INFO: u32 = 8;
    /// Protocol version (client's in the request, server's in the reply).
    pub const PROTOCOL_VERSION: u32 = 9;
    /// Server software version string.
    pub const SERVER_VERSION: u32 = 10;
    /// Server instance identifier.
    pub const SERVER_ID: u32 = 11;
    /// New password in a password change request.
    pub const NEW_PASSWORD: u32 = 12;
    /// Notification code in a [`crate::protocol::codes::NOTIFY`] push.
    pub const NOTIFY_CODE: u32 = 13;
    /// Notification payload in a [`crate::protocol::codes::NOTIFY`] push.
    pub const NOTIFY_DATA: u32 = 14;

    /// Object id.
    pub const OBJECT_ID: u32 = 32;
    /// Object class discriminator.
    pub const OBJECT_CLASS: u32 = 33;
    /// Object name.
    pub const OBJECT_NAME: u32 = 34;
    /// Object GUID.
    pub const OBJECT_GUID: u32 = 35;
    /// Object status.
    pub const OBJECT_STATUS: u32 = 36;
    /// Parent object id list.
    pub const PARENT_LIST: u32 = 37;
    /// Child object id list.
    pub const CHILD_LIST: u32 = 38;
    /// Node primary IP address.
    pub const PRIMARY_ADDRESS: u32 = 40;
    /// Node platform name.
    pub const PLATFORM_NAME: u32 = 41;
    /// Zone unique identification number.
    pub const ZONE_UIN: u32 = 42;
    /// Template version.
    pub const TEMPLATE_VERSION: u32 = 43;
    /// Policy type discriminator.
    pub const POLICY_TYPE: u32 = 44;

    /// Sensor flag bits.
    pub const SENSOR_FLAGS: u32 = 64;
    /// Sensor MAC address (binary).
    pub const MAC_ADDRESS: u32 = 65;
    /// Sensor device class discriminator.
    pub const DEVICE_CLASS: u32 = 66;
    /// Sensor vendor.
    pub const VENDOR: u32 = 67;
    /// Sensor communication protocol discriminator.
    pub const COMM_PROTOCOL: u32 = 68;
    /// Protocol-dependent sensor configuration sub-block.
    pub const SENSOR_CONFIG: u32 = 69;
    /// Sensor serial number.
    pub const SERIAL_NUMBER: u32 = 70;
    /// Sensor device address.
    pub const DEVICE_ADDRESS: u32 = 71;
    /// Sensor description.
    pub const DESCRIPTION: u32 = 72;
    /// Time of the sensor's last connection.
    pub const LAST_CONNECTION: u32 = 73;
    /// Sensor frame count.
    pub const FRAME_COUNT: u32 = 74;
    /// Sensor signal strength.
    pub const SIGNAL_STRENGTH: u32 = 75;
    /// Sensor signal/noise ratio.
    pub const SIGNAL_NOISE: u32 = 76;
    /// Sensor radio frequency.
    pub const FREQUENCY: u32 = 77;
    /// Id of the node proxying this sensor.
    pub const PROXY_NODE: u32 = 78;

    /// Source node id of a metric update.
    pub const METRIC_NODE: u32 = 96;
    /// Metric (data collection item) id.
    pub const METRIC_ID: u32 = 97;
    /// Collection timestamp of a metric value.
    pub const METRIC_TIMESTAMP: u32 = 98;
    /// Metric value, rendered as text.
    pub const METRIC_VALUE: u32 = 99;

    /// Alarm id.
    pub const ALARM_ID: u32 = 112;
    /// Id of the object the alarm originates from.
    pub const ALARM_SOURCE: u32 = 113;
    /// Alarm severity.
    pub const ALARM_SEVERITY: u32 = 114;
    /// Alarm lifecycle state.
    pub const ALARM_STATE: u32 = 115;
    /// Alarm message text.
    pub const ALARM_MESSAGE: u32 = 116;
    /// Alarm creation time.
    pub const ALARM_CREATED: u32 = 117;
    /// Time of the alarm's last state change.
    pub const ALARM_CHANGED: u32 = 118;

    /// Entry value inside a list sub-block.
    pub const LIST_ENTRY: u32 = 1;
}

/// Request result codes carried in [`fields::RESULT_CODE`].
pub mod rcc {
    /// Request completed successfully.
    pub const SUCCESS: u32 = 0;
    /// Credentials rejected.
    pub const ACCESS_DENIED: u32 = 1;
    /// Credentials accepted but the password has expired.
    pub const PASSWORD_EXPIRED: u32 = 2;
    /// Client and server protocol versions are incompatible.
    pub const VERSION_MISMATCH: u32 = 3;
    /// Request was malformed or referenced an unknown entity.
    pub const INVALID_REQUEST: u32 = 4;
    /// Internal server failure.
    pub const INTERNAL_ERROR: u32 = 5;
}
