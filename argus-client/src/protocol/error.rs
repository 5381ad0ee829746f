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

//! Protocol layer error types.
//!
//! A `ProtocolError` describes a malformed or inconsistent frame. With the
//! exception of [`ProtocolError::Io`], these errors are local to a single
//! frame: the session logs them, drops the offending frame, and keeps
//! receiving.

use std::io;
use thiserror::Error;

/// Errors raised while encoding or decoding protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame's declared content and its actual size disagree.
    #[error("inconsistent frame length: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Number of bytes the frame declared.
        expected: usize,
        /// Number of bytes actually present.
        actual: usize,
    },

    /// The frame length header exceeds the allowed maximum.
    ///
    /// This limit prevents a misbehaving peer from forcing a huge
    /// allocation with a single bogus header.
    #[error("frame size {size} exceeds maximum allowed size {limit}")]
    FrameTooLarge {
        /// Declared or computed frame size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },

    /// A field's declared length is inconsistent with the frame contents.
    #[error("field {field} has an inconsistent length")]
    LengthMismatch {
        /// Code of the offending field.
        field: u32,
    },

    /// A field carries a type tag this client does not understand.
    #[error("unknown type tag {tag} for field {field}")]
    UnknownTypeTag {
        /// Code of the offending field.
        field: u32,
        /// The unrecognized tag byte.
        tag: u8,
    },

    /// A string field contains invalid UTF-8.
    #[error("field {field} contains invalid UTF-8")]
    InvalidUtf8 {
        /// Code of the offending field.
        field: u32,
    },

    /// A field value is out of the representable range.
    #[error("field {field} contains an invalid value")]
    InvalidValue {
        /// Code of the offending field.
        field: u32,
    },

    /// Sub-blocks are nested deeper than the decoder allows.
    #[error("sub-blocks nested deeper than {limit} levels")]
    NestingTooDeep {
        /// Maximum nesting depth.
        limit: usize,
    },

    /// A fragment arrived out of sequence.
    ///
    /// The partial message it belonged to is discarded.
    #[error("fragment for request {request_id} out of order: expected sequence {expected}, got {received}")]
    FragmentOutOfOrder {
        /// Request id of the fragmented message.
        request_id: u64,
        /// Expected sequence number.
        expected: u32,
        /// Sequence number actually received.
        received: u32,
    },

    /// A reassembly buffer grew past the allowed bound.
    ///
    /// The partial message is discarded; this caps the memory a
    /// misbehaving peer can pin with abandoned fragment sequences.
    #[error("reassembly buffer for request {request_id} exceeds {limit} bytes")]
    ReassemblyOverflow {
        /// Request id of the fragmented message.
        request_id: u64,
        /// Maximum reassembly buffer size.
        limit: usize,
    },

    /// An I/O error occurred while reading or writing a frame.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ProtocolError {
    /// Returns `true` if the session can keep receiving after this error.
    ///
    /// Everything except [`ProtocolError::Io`] affects only the offending
    /// frame; an I/O error means the channel itself is gone.
    #[must_use]
    pub const fn is_frame_local(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

impl From<io::Error> for ProtocolError {
    fn from(source: io::Error) -> Self {
        Self::Io { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_local_classification() {
        let truncated = ProtocolError::Truncated {
            expected: 10,
            actual: 4,
        };
        assert!(truncated.is_frame_local());

        let io = ProtocolError::Io {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"),
        };
        assert!(!io.is_frame_local());
    }

    #[test]
    fn test_display() {
        let err = ProtocolError::FragmentOutOfOrder {
            request_id: 7,
            expected: 2,
            received: 4,
        };
        let text = err.to_string();
        assert!(text.contains("request 7"));
        assert!(text.contains("expected sequence 2"));
    }
}
