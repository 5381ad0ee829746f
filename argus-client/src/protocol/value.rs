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

//! Typed field values.
//!
//! Every field in a message carries one of the value types defined here.
//! 32-bit and 64-bit integers are distinct wire types so sign and width
//! survive a round trip exactly; strings carry an explicit byte length
//! (never a NUL terminator) so binary-safe paths may embed NUL bytes.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// An ordered mapping from field code to value.
///
/// Used both for the top-level field table of a [`crate::protocol::Message`]
/// and for the nested sub-blocks of an [`FieldValue::Array`] field.
pub type FieldTable = BTreeMap<u32, FieldValue>;

/// Wire type tags, one per [`FieldValue`] variant.
pub mod tag {
    /// Signed 32-bit integer.
    pub const INT32: u8 = 0;
    /// Signed 64-bit integer.
    pub const INT64: u8 = 1;
    /// 64-bit IEEE 754 float.
    pub const FLOAT: u8 = 2;
    /// Length-prefixed UTF-8 string.
    pub const STRING: u8 = 3;
    /// Length-prefixed binary blob.
    pub const BINARY: u8 = 4;
    /// 128-bit UUID.
    pub const UUID: u8 = 5;
    /// Unix timestamp (seconds, signed 64-bit).
    pub const TIMESTAMP: u8 = 6;
    /// Array of nested sub-blocks.
    pub const ARRAY: u8 = 7;
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 64-bit IEEE 754 float.
    Float(f64),
    /// UTF-8 string with explicit byte length; embedded NUL bytes allowed.
    String(String),
    /// Raw binary blob.
    Binary(Vec<u8>),
    /// 128-bit UUID.
    Uuid(Uuid),
    /// Point in time with second resolution.
    Timestamp(DateTime<Utc>),
    /// Array of nested sub-blocks, each its own field table.
    Array(Vec<FieldTable>),
}

impl FieldValue {
    /// Returns the wire type tag for this value.
    #[must_use]
    pub const fn type_tag(&self) -> u8 {
        match self {
            Self::Int32(_) => tag::INT32,
            Self::Int64(_) => tag::INT64,
            Self::Float(_) => tag::FLOAT,
            Self::String(_) => tag::STRING,
            Self::Binary(_) => tag::BINARY,
            Self::Uuid(_) => tag::UUID,
            Self::Timestamp(_) => tag::TIMESTAMP,
            Self::Array(_) => tag::ARRAY,
        }
    }

    /// Returns a human-readable name for this value's type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::Array(_) => "array",
        }
    }

    /// Returns the contained `i32`, if this is an [`FieldValue::Int32`].
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value widened to `i64`, if this is an integer field.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the contained float, if this is a [`FieldValue::Float`].
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the contained string slice, if this is a [`FieldValue::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the contained bytes, if this is a [`FieldValue::Binary`].
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the contained UUID, if this is a [`FieldValue::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the contained timestamp, if this is a [`FieldValue::Timestamp`].
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the contained sub-blocks, if this is an [`FieldValue::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<&[FieldTable]> {
        match self {
            Self::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Int32(v as i32)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Int64(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        Self::Binary(v.to_vec())
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<FieldTable>> for FieldValue {
    fn from(v: Vec<FieldTable>) -> Self {
        Self::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags_are_distinct() {
        let values = [
            FieldValue::Int32(1),
            FieldValue::Int64(1),
            FieldValue::Float(1.0),
            FieldValue::String("x".to_string()),
            FieldValue::Binary(vec![1]),
            FieldValue::Uuid(Uuid::nil()),
            FieldValue::Timestamp(DateTime::from_timestamp(0, 0).unwrap()),
            FieldValue::Array(Vec::new()),
        ];
        let mut tags: Vec<u8> = values.iter().map(FieldValue::type_tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), values.len());
    }

    #[test]
    fn test_integer_widths_are_distinct_types() {
        // An int32 and an int64 with the same numeric value must not compare equal.
        assert_ne!(FieldValue::Int32(42), FieldValue::Int64(42));
        assert_eq!(FieldValue::Int32(42).as_i64(), Some(42));
        assert_eq!(FieldValue::Int64(42).as_i32(), None);
    }

    #[test]
    fn test_sign_preserved_through_unsigned_conversion() {
        let v = FieldValue::from(u32::MAX);
        assert_eq!(v.as_i32(), Some(-1));
        let v = FieldValue::from(u64::MAX);
        assert_eq!(v.as_i64(), Some(-1));
    }

    #[test]
    fn test_string_allows_embedded_nul() {
        let v = FieldValue::from("a\0b");
        assert_eq!(v.as_str(), Some("a\0b"));
    }
}
