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

//! The protocol message: a field table with a code and a correlation id.
//!
//! # Example
//!
//! ```rust
//! use argus_client::protocol::{Message, codes, fields};
//!
//! let mut msg = Message::new(codes::LOGIN, 1);
//! msg.set_string(fields::LOGIN_NAME, "admin");
//! msg.set_u32(fields::PROTOCOL_VERSION, 4);
//!
//! assert_eq!(msg.get_str(fields::LOGIN_NAME), Some("admin"));
//! assert_eq!(msg.get_u32(fields::PROTOCOL_VERSION), Some(4));
//! assert_eq!(msg.field_count(), 2);
//! ```

use super::value::{FieldTable, FieldValue};
use super::{codes, fields, flags};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A message kind identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageCode(u16);

impl MessageCode {
    /// Creates a message code from its raw wire value.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` if messages of this kind are server pushes rather
    /// than replies to client requests.
    #[must_use]
    pub const fn is_push(self) -> bool {
        matches!(
            self,
            codes::OBJECT
                | codes::OBJECT_UPDATE
                | codes::OBJECT_DELETED
                | codes::METRIC_DATA
                | codes::ALARM_UPDATE
                | codes::NOTIFY
                | codes::KEEPALIVE
        )
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// A protocol message: a tagged, ordered field table plus routing headers.
///
/// The `request_id` correlates replies to requests; it is unique among
/// concurrently outstanding requests on one session, and `0` is reserved
/// for spontaneous server pushes.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    code: MessageCode,
    flags: u16,
    request_id: u64,
    fields: FieldTable,
}

impl Message {
    /// Creates an empty message with the given code and request id.
    #[must_use]
    pub fn new(code: MessageCode, request_id: u64) -> Self {
        Self {
            code,
            flags: 0,
            request_id,
            fields: FieldTable::new(),
        }
    }

    /// Creates a message from already-decoded parts.
    #[must_use]
    pub(crate) fn from_parts(
        code: MessageCode,
        flags: u16,
        request_id: u64,
        fields: FieldTable,
    ) -> Self {
        Self {
            code,
            flags,
            request_id,
            fields,
        }
    }

    /// Returns the message code.
    #[must_use]
    pub const fn code(&self) -> MessageCode {
        self.code
    }

    /// Returns the correlation id.
    #[must_use]
    pub const fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Sets the correlation id.
    pub fn set_request_id(&mut self, request_id: u64) {
        self.request_id = request_id;
    }

    /// Returns the raw header flags.
    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns `true` if the given flag bit is set.
    #[must_use]
    pub const fn has_flag(&self, bit: u16) -> bool {
        self.flags & bit != 0
    }

    /// Sets a flag bit.
    pub fn set_flag(&mut self, bit: u16) {
        self.flags |= bit;
    }

    /// Clears a flag bit.
    pub fn clear_flag(&mut self, bit: u16) {
        self.flags &= !bit;
    }

    /// Returns `true` if this message is a server push.
    #[must_use]
    pub const fn is_push(&self) -> bool {
        self.code.is_push()
    }

    /// Returns `true` if more reply chunks follow for the same request.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_flag(flags::MORE_FOLLOWS)
    }

    /// Returns the number of fields in this message.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if a field with the given code is present.
    #[must_use]
    pub fn contains(&self, field: u32) -> bool {
        self.fields.contains_key(&field)
    }

    /// Returns the raw value of a field, if present.
    #[must_use]
    pub fn get(&self, field: u32) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: u32, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    /// Iterates over all fields in field-code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Returns a reference to the underlying field table.
    #[must_use]
    pub(crate) fn fields(&self) -> &FieldTable {
        &self.fields
    }

    // Typed setters, mirroring the wire types.

    /// Sets a signed 32-bit integer field.
    pub fn set_i32(&mut self, field: u32, value: i32) {
        self.set(field, FieldValue::Int32(value));
    }

    /// Sets an unsigned 32-bit integer field (stored as int32 on the wire).
    pub fn set_u32(&mut self, field: u32, value: u32) {
        self.set(field, FieldValue::Int32(value as i32));
    }

    /// Sets a signed 64-bit integer field.
    pub fn set_i64(&mut self, field: u32, value: i64) {
        self.set(field, FieldValue::Int64(value));
    }

    /// Sets an unsigned 64-bit integer field (stored as int64 on the wire).
    pub fn set_u64(&mut self, field: u32, value: u64) {
        self.set(field, FieldValue::Int64(value as i64));
    }

    /// Sets a float field.
    pub fn set_f64(&mut self, field: u32, value: f64) {
        self.set(field, FieldValue::Float(value));
    }

    /// Sets a string field.
    pub fn set_string(&mut self, field: u32, value: impl Into<String>) {
        self.set(field, FieldValue::String(value.into()));
    }

    /// Sets a binary field.
    pub fn set_binary(&mut self, field: u32, value: impl Into<Vec<u8>>) {
        self.set(field, FieldValue::Binary(value.into()));
    }

    /// Sets a UUID field.
    pub fn set_uuid(&mut self, field: u32, value: Uuid) {
        self.set(field, FieldValue::Uuid(value));
    }

    /// Sets a timestamp field.
    pub fn set_timestamp(&mut self, field: u32, value: DateTime<Utc>) {
        self.set(field, FieldValue::Timestamp(value));
    }

    /// Sets an array field from a list of sub-blocks.
    pub fn set_array(&mut self, field: u32, blocks: Vec<FieldTable>) {
        self.set(field, FieldValue::Array(blocks));
    }

    /// Sets a list of 64-bit ids as an array of single-entry sub-blocks.
    pub fn set_id_list(&mut self, field: u32, ids: &[u64]) {
        let blocks = ids
            .iter()
            .map(|id| {
                let mut block = FieldTable::new();
                block.insert(fields::LIST_ENTRY, FieldValue::Int64(*id as i64));
                block
            })
            .collect();
        self.set_array(field, blocks);
    }

    // Typed getters. Absent fields and type mismatches both yield `None`,
    // matching the partial-update semantics of object messages.

    /// Returns a field as `i32`.
    #[must_use]
    pub fn get_i32(&self, field: u32) -> Option<i32> {
        self.get(field).and_then(FieldValue::as_i32)
    }

    /// Returns a field as `u32`.
    #[must_use]
    pub fn get_u32(&self, field: u32) -> Option<u32> {
        self.get_i32(field).map(|v| v as u32)
    }

    /// Returns an integer field widened to `i64`.
    #[must_use]
    pub fn get_i64(&self, field: u32) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_i64)
    }

    /// Returns an integer field as `u64`.
    #[must_use]
    pub fn get_u64(&self, field: u32) -> Option<u64> {
        self.get_i64(field).map(|v| v as u64)
    }

    /// Returns a field as `f64`.
    #[must_use]
    pub fn get_f64(&self, field: u32) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Returns a string field as a borrowed slice.
    #[must_use]
    pub fn get_str(&self, field: u32) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// Returns a string field as an owned `String`.
    #[must_use]
    pub fn get_string(&self, field: u32) -> Option<String> {
        self.get_str(field).map(str::to_string)
    }

    /// Returns a binary field as a borrowed slice.
    #[must_use]
    pub fn get_binary(&self, field: u32) -> Option<&[u8]> {
        self.get(field).and_then(FieldValue::as_bytes)
    }

    /// Returns a UUID field.
    #[must_use]
    pub fn get_uuid(&self, field: u32) -> Option<Uuid> {
        self.get(field).and_then(FieldValue::as_uuid)
    }

    /// Returns a timestamp field.
    #[must_use]
    pub fn get_timestamp(&self, field: u32) -> Option<DateTime<Utc>> {
        self.get(field).and_then(FieldValue::as_timestamp)
    }

    /// Returns an array field's sub-blocks.
    #[must_use]
    pub fn get_array(&self, field: u32) -> Option<&[FieldTable]> {
        self.get(field).and_then(FieldValue::as_array)
    }

    /// Returns an id list previously written with [`Message::set_id_list`].
    #[must_use]
    pub fn get_id_list(&self, field: u32) -> Option<Vec<u64>> {
        let blocks = self.get_array(field)?;
        Some(
            blocks
                .iter()
                .filter_map(|block| block.get(&fields::LIST_ENTRY))
                .filter_map(FieldValue::as_i64)
                .map(|id| id as u64)
                .collect(),
        )
    }

    /// Merges a later reply chunk into this message.
    ///
    /// Array fields are appended, everything else is overwritten. Used by
    /// the dispatcher to accumulate multi-part replies before resolving
    /// the caller; intermediate chunks are never exposed directly.
    pub(crate) fn absorb(&mut self, chunk: Message) {
        for (code, value) in chunk.fields {
            match (self.fields.get_mut(&code), value) {
                (Some(FieldValue::Array(existing)), FieldValue::Array(more)) => {
                    existing.extend(more);
                }
                (_, value) => {
                    self.fields.insert(code, value);
                }
            }
        }
        self.flags = chunk.flags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{codes, fields, flags};

    #[test]
    fn test_typed_accessors() {
        let mut msg = Message::new(codes::OBJECT, 0);
        msg.set_u64(fields::OBJECT_ID, 42);
        msg.set_string(fields::OBJECT_NAME, "core-switch");
        msg.set_u32(fields::OBJECT_STATUS, 1);

        assert_eq!(msg.get_u64(fields::OBJECT_ID), Some(42));
        assert_eq!(msg.get_str(fields::OBJECT_NAME), Some("core-switch"));
        assert_eq!(msg.get_u32(fields::OBJECT_STATUS), Some(1));
        assert_eq!(msg.get_u32(fields::OBJECT_GUID), None);
    }

    #[test]
    fn test_type_mismatch_yields_none() {
        let mut msg = Message::new(codes::OBJECT, 0);
        msg.set_string(fields::OBJECT_NAME, "router");
        assert_eq!(msg.get_i32(fields::OBJECT_NAME), None);
        assert_eq!(msg.get_binary(fields::OBJECT_NAME), None);
    }

    #[test]
    fn test_id_list_round_trip() {
        let mut msg = Message::new(codes::OBJECT, 0);
        msg.set_id_list(fields::CHILD_LIST, &[1, 2, 1000]);
        assert_eq!(msg.get_id_list(fields::CHILD_LIST), Some(vec![1, 2, 1000]));
    }

    #[test]
    fn test_push_classification() {
        assert!(Message::new(codes::OBJECT_UPDATE, 0).is_push());
        assert!(Message::new(codes::ALARM_UPDATE, 0).is_push());
        assert!(!Message::new(codes::LOGIN_REPLY, 1).is_push());
        assert!(!Message::new(codes::REQUEST_COMPLETED, 1).is_push());
    }

    #[test]
    fn test_absorb_appends_arrays_and_overwrites_scalars() {
        let mut first = Message::new(codes::REQUEST_COMPLETED, 9);
        first.set_flag(flags::MORE_FOLLOWS);
        first.set_id_list(fields::CHILD_LIST, &[1, 2]);
        first.set_u32(fields::RESULT_CODE, 99);

        let mut second = Message::new(codes::REQUEST_COMPLETED, 9);
        second.set_id_list(fields::CHILD_LIST, &[3]);
        second.set_u32(fields::RESULT_CODE, 0);

        first.absorb(second);
        assert_eq!(first.get_id_list(fields::CHILD_LIST), Some(vec![1, 2, 3]));
        assert_eq!(first.get_u32(fields::RESULT_CODE), Some(0));
        assert!(!first.has_more());
    }

    #[test]
    fn test_flag_manipulation() {
        let mut msg = Message::new(codes::REQUEST_COMPLETED, 1);
        assert!(!msg.has_more());
        msg.set_flag(flags::MORE_FOLLOWS);
        assert!(msg.has_more());
        msg.clear_flag(flags::MORE_FOLLOWS);
        assert!(!msg.has_more());
    }
}
