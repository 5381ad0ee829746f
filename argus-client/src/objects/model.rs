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

//! The cached object model.
//!
//! Server-side managed entities are mirrored as [`NetObject`]s. Class
//! behavior is a tagged variant ([`ObjectClass`]), dispatched on a
//! discriminator field at decode time rather than an inheritance tree.
//! Parent/child relations are ID lists resolved through the cache, never
//! direct object pointers; this keeps the graph cycle-free and lets
//! either side of a relation be removed independently.
//!
//! Updates are partial: a message carries only changed fields, which are
//! merged over the existing state, leaving absent fields untouched.

use crate::protocol::{Message, fields};
use chrono::{DateTime, Utc};
use std::fmt;
use std::net::IpAddr;
use tracing::warn;
use uuid::Uuid;

/// Sensor communication protocols (discriminator values for
/// [`SensorConfig`]).
pub mod comm {
    /// Protocol not reported.
    pub const UNKNOWN: u32 = 0;
    /// LoRaWAN radio.
    pub const LORAWAN: u32 = 1;
    /// DLMS/COSEM metering.
    pub const DLMS: u32 = 2;
}

/// Object class discriminator values.
mod class {
    pub const GENERIC: u32 = 0;
    pub const NODE: u32 = 1;
    pub const SENSOR: u32 = 2;
    pub const ZONE: u32 = 3;
    pub const TEMPLATE: u32 = 4;
    pub const POLICY: u32 = 5;
}

/// A MAC address as reported by a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a MAC address from raw bytes; `None` unless exactly six
    /// bytes are given.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.try_into().ok()?;
        Some(Self(octets))
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Object status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectStatus {
    /// Operating normally.
    Normal,
    /// Warning condition.
    Warning,
    /// Minor problem.
    Minor,
    /// Major problem.
    Major,
    /// Critical problem.
    Critical,
    /// Status not (yet) known.
    #[default]
    Unknown,
    /// Object is not managed.
    Unmanaged,
}

impl ObjectStatus {
    /// Maps a raw protocol value; unrecognized values become `Unknown`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::Warning,
            2 => Self::Minor,
            3 => Self::Major,
            4 => Self::Critical,
            6 => Self::Unmanaged,
            _ => Self::Unknown,
        }
    }
}

/// Sensor device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    /// Class not reported.
    #[default]
    Unknown,
    /// Uninterruptible power supply.
    Ups,
    /// Water meter.
    WaterMeter,
    /// Electricity meter.
    ElectricityMeter,
}

impl DeviceClass {
    /// Maps a raw protocol value; unrecognized values become `Unknown`.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Ups,
            2 => Self::WaterMeter,
            3 => Self::ElectricityMeter,
            _ => Self::Unknown,
        }
    }

    /// Returns a display label for this class.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Ups => "UPS",
            Self::WaterMeter => "Water meter",
            Self::ElectricityMeter => "Electricity meter",
        }
    }
}

/// Protocol-dependent sensor configuration.
///
/// The communication protocol discriminator is read before the
/// configuration sub-block is decoded. An unknown discriminator is a
/// soft condition: the sensor is still cached with its base fields and
/// the configuration is kept as [`SensorConfig::Unrecognized`].
#[derive(Debug, Clone, PartialEq)]
pub enum SensorConfig {
    /// LoRaWAN device configuration.
    LoraWan(LoraWanConfig),
    /// DLMS/COSEM device configuration.
    Dlms(DlmsConfig),
    /// Configuration for a protocol this client does not understand.
    Unrecognized {
        /// The unrecognized protocol discriminator.
        protocol: u32,
    },
}

/// LoRaWAN device configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoraWanConfig {
    /// Device EUI.
    pub device_eui: String,
    /// Application EUI.
    pub application_eui: String,
    /// Radio regulatory region.
    pub region: String,
}

/// DLMS/COSEM device configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DlmsConfig {
    /// Network address of the metering endpoint.
    pub peer_address: String,
    /// Logical device id.
    pub logical_device: u32,
    /// Client address used on the DLMS association.
    pub client_address: u32,
}

// Field codes inside the SENSOR_CONFIG sub-block, per protocol.
mod cfg {
    pub const LORAWAN_DEVICE_EUI: u32 = 1;
    pub const LORAWAN_APPLICATION_EUI: u32 = 2;
    pub const LORAWAN_REGION: u32 = 3;

    pub const DLMS_PEER_ADDRESS: u32 = 1;
    pub const DLMS_LOGICAL_DEVICE: u32 = 2;
    pub const DLMS_CLIENT_ADDRESS: u32 = 3;
}

/// Sensor-specific attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorData {
    /// Sensor flag bits.
    pub flags: u32,
    /// MAC address, if reported.
    pub mac_address: Option<MacAddress>,
    /// Device class.
    pub device_class: DeviceClass,
    /// Vendor name.
    pub vendor: Option<String>,
    /// Serial number.
    pub serial_number: Option<String>,
    /// Protocol-level device address.
    pub device_address: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Raw communication protocol discriminator.
    pub comm_protocol: u32,
    /// Protocol-dependent configuration.
    pub config: Option<SensorConfig>,
    /// Time of the last connection from the device.
    pub last_connection: Option<DateTime<Utc>>,
    /// Number of frames received from the device.
    pub frame_count: u32,
    /// Signal strength; positive when no information is available.
    pub signal_strength: i32,
    /// Signal/noise ratio.
    pub signal_noise: i32,
    /// Radio frequency.
    pub frequency: u32,
    /// Id of the node proxying this sensor, 0 if none.
    pub proxy_node: u64,
}

impl SensorData {
    fn apply(&mut self, msg: &Message) {
        if let Some(v) = msg.get_u32(fields::SENSOR_FLAGS) {
            self.flags = v;
        }
        if let Some(bytes) = msg.get_binary(fields::MAC_ADDRESS) {
            match MacAddress::from_bytes(bytes) {
                Some(mac) => self.mac_address = Some(mac),
                None => warn!(len = bytes.len(), "ignoring malformed MAC address field"),
            }
        }
        if let Some(v) = msg.get_u32(fields::DEVICE_CLASS) {
            self.device_class = DeviceClass::from_raw(v);
        }
        if let Some(v) = msg.get_string(fields::VENDOR) {
            self.vendor = Some(v);
        }
        if let Some(v) = msg.get_string(fields::SERIAL_NUMBER) {
            self.serial_number = Some(v);
        }
        if let Some(v) = msg.get_string(fields::DEVICE_ADDRESS) {
            self.device_address = Some(v);
        }
        if let Some(v) = msg.get_string(fields::DESCRIPTION) {
            self.description = Some(v);
        }
        if let Some(v) = msg.get_timestamp(fields::LAST_CONNECTION) {
            self.last_connection = Some(v);
        }
        if let Some(v) = msg.get_u32(fields::FRAME_COUNT) {
            self.frame_count = v;
        }
        if let Some(v) = msg.get_i32(fields::SIGNAL_STRENGTH) {
            self.signal_strength = v;
        }
        if let Some(v) = msg.get_i32(fields::SIGNAL_NOISE) {
            self.signal_noise = v;
        }
        if let Some(v) = msg.get_u32(fields::FREQUENCY) {
            self.frequency = v;
        }
        if let Some(v) = msg.get_u64(fields::PROXY_NODE) {
            self.proxy_node = v;
        }

        // The protocol discriminator selects the configuration decoder.
        if let Some(protocol) = msg.get_u32(fields::COMM_PROTOCOL) {
            self.comm_protocol = protocol;
            let block = msg
                .get_array(fields::SENSOR_CONFIG)
                .and_then(|blocks| blocks.first());
            self.config = match protocol {
                comm::UNKNOWN => None,
                comm::LORAWAN => Some(SensorConfig::LoraWan(LoraWanConfig {
                    device_eui: block
                        .and_then(|b| b.get(&cfg::LORAWAN_DEVICE_EUI))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    application_eui: block
                        .and_then(|b| b.get(&cfg::LORAWAN_APPLICATION_EUI))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    region: block
                        .and_then(|b| b.get(&cfg::LORAWAN_REGION))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                })),
                comm::DLMS => Some(SensorConfig::Dlms(DlmsConfig {
                    peer_address: block
                        .and_then(|b| b.get(&cfg::DLMS_PEER_ADDRESS))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    logical_device: block
                        .and_then(|b| b.get(&cfg::DLMS_LOGICAL_DEVICE))
                        .and_then(|v| v.as_i32())
                        .unwrap_or_default() as u32,
                    client_address: block
                        .and_then(|b| b.get(&cfg::DLMS_CLIENT_ADDRESS))
                        .and_then(|v| v.as_i32())
                        .unwrap_or_default() as u32,
                })),
                other => {
                    warn!(
                        protocol = other,
                        "unrecognized sensor communication protocol, keeping base fields only"
                    );
                    Some(SensorConfig::Unrecognized { protocol: other })
                }
            };
        }
    }
}

/// Node-specific attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeData {
    /// Primary management address.
    pub primary_address: Option<IpAddr>,
    /// Reported platform name.
    pub platform_name: Option<String>,
}

impl NodeData {
    fn apply(&mut self, msg: &Message) {
        if let Some(text) = msg.get_str(fields::PRIMARY_ADDRESS) {
            match text.parse() {
                Ok(addr) => self.primary_address = Some(addr),
                Err(_) => warn!(address = text, "ignoring unparsable primary address"),
            }
        }
        if let Some(v) = msg.get_string(fields::PLATFORM_NAME) {
            self.platform_name = Some(v);
        }
    }
}

/// Zone-specific attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneData {
    /// Zone unique identification number.
    pub uin: u32,
}

/// Template-specific attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateData {
    /// Template version.
    pub version: u32,
}

/// Policy-specific attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyData {
    /// Policy type discriminator.
    pub policy_type: u32,
}

/// Class-specific object data, dispatched on the class discriminator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ObjectClass {
    /// Object of a class this client has no specialized model for.
    #[default]
    Generic,
    /// A managed node.
    Node(NodeData),
    /// A sensor.
    Sensor(SensorData),
    /// A zone.
    Zone(ZoneData),
    /// A data collection template.
    Template(TemplateData),
    /// An agent policy.
    Policy(PolicyData),
}

impl ObjectClass {
    fn from_discriminator(raw: u32) -> Self {
        match raw {
            class::GENERIC => Self::Generic,
            class::NODE => Self::Node(NodeData::default()),
            class::SENSOR => Self::Sensor(SensorData::default()),
            class::ZONE => Self::Zone(ZoneData::default()),
            class::TEMPLATE => Self::Template(TemplateData::default()),
            class::POLICY => Self::Policy(PolicyData::default()),
            other => {
                warn!(class = other, "unrecognized object class, caching as generic");
                Self::Generic
            }
        }
    }

    const fn discriminator(&self) -> u32 {
        match self {
            Self::Generic => class::GENERIC,
            Self::Node(_) => class::NODE,
            Self::Sensor(_) => class::SENSOR,
            Self::Zone(_) => class::ZONE,
            Self::Template(_) => class::TEMPLATE,
            Self::Policy(_) => class::POLICY,
        }
    }

    /// Returns the class name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::Node(_) => "Node",
            Self::Sensor(_) => "Sensor",
            Self::Zone(_) => "Zone",
            Self::Template(_) => "Template",
            Self::Policy(_) => "Policy",
        }
    }

    fn apply(&mut self, msg: &Message) {
        match self {
            Self::Generic => {}
            Self::Node(data) => data.apply(msg),
            Self::Sensor(data) => data.apply(msg),
            Self::Zone(data) => {
                if let Some(v) = msg.get_u32(fields::ZONE_UIN) {
                    data.uin = v;
                }
            }
            Self::Template(data) => {
                if let Some(v) = msg.get_u32(fields::TEMPLATE_VERSION) {
                    data.version = v;
                }
            }
            Self::Policy(data) => {
                if let Some(v) = msg.get_u32(fields::POLICY_TYPE) {
                    data.policy_type = v;
                }
            }
        }
    }
}

/// A cached mirror of one server-side managed object.
///
/// Instances are produced and mutated exclusively by the session's
/// receive task applying decoded update messages; consumers only ever
/// read shared snapshots obtained from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct NetObject {
    /// Object id, unique across the object graph.
    pub id: u64,
    /// Stable object GUID.
    pub guid: Uuid,
    /// Object name.
    pub name: String,
    /// Current status.
    pub status: ObjectStatus,
    /// Ids of parent objects.
    pub parents: Vec<u64>,
    /// Ids of child objects.
    pub children: Vec<u64>,
    /// Class-specific data.
    pub class: ObjectClass,
}

impl NetObject {
    /// Creates an empty object shell for the given id.
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            guid: Uuid::nil(),
            name: String::new(),
            status: ObjectStatus::Unknown,
            parents: Vec::new(),
            children: Vec::new(),
            class: ObjectClass::Generic,
        }
    }

    /// Merges the fields present in an update message over this object.
    ///
    /// Fields absent from the message keep their prior values; this is
    /// the partial-update push semantic of the server. A class
    /// discriminator differing from the current class rebuilds the
    /// class-specific data from scratch.
    pub(crate) fn apply(&mut self, msg: &Message) {
        if let Some(guid) = msg.get_uuid(fields::OBJECT_GUID) {
            self.guid = guid;
        }
        if let Some(name) = msg.get_string(fields::OBJECT_NAME) {
            self.name = name;
        }
        if let Some(status) = msg.get_u32(fields::OBJECT_STATUS) {
            self.status = ObjectStatus::from_raw(status);
        }
        if let Some(parents) = msg.get_id_list(fields::PARENT_LIST) {
            self.parents = parents;
        }
        if let Some(children) = msg.get_id_list(fields::CHILD_LIST) {
            self.children = children;
        }

        if let Some(raw) = msg.get_u32(fields::OBJECT_CLASS) {
            if self.class.discriminator() != raw {
                self.class = ObjectClass::from_discriminator(raw);
            }
        }
        self.class.apply(msg);
    }

    /// Returns the class name of this object.
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        self.class.name()
    }
}
