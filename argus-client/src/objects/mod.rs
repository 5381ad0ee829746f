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

//! Object layer: the cached mirror of the server's object graph.
//!
//! Managed entities (nodes, sensors, zones, templates, policies) live in
//! the [`ObjectCache`], keyed by 64-bit object id. Objects are never
//! constructed by API consumers: they materialize and change only by the
//! session's receive task applying decoded update messages, so the cache
//! holds at most one object per id and updates merge fields without ever
//! replacing an object's identity.
//!
//! Class-specific behavior is a tagged variant ([`ObjectClass`]) chosen
//! by a discriminator field at decode time. Unknown discriminators are
//! soft conditions: the object is still cached with its base fields.

pub mod cache;
pub mod model;

pub use cache::ObjectCache;
pub use model::{
    DeviceClass, DlmsConfig, LoraWanConfig, MacAddress, NetObject, NodeData, ObjectClass,
    ObjectStatus, PolicyData, SensorConfig, SensorData, TemplateData, ZoneData,
};
