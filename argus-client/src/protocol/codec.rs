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

//! Wire codec: frame encoding, decoding, and fragment reassembly.
//!
//! A message whose encoded payload fits under [`MAX_FRAME_SIZE`] travels
//! as a single frame. Larger messages are split into fragments carrying
//! consecutive sequence numbers; the [`Reassembler`] stitches them back
//! together and fails the sequence on any out-of-order fragment. Partial
//! messages are bounded both in count and in accumulated bytes so a
//! misbehaving peer cannot pin unbounded memory with abandoned sequences.
//!
//! Decoding never panics past the caller: every malformed input maps to a
//! typed [`ProtocolError`].

use super::error::ProtocolError;
use super::flags;
use super::message::{Message, MessageCode};
use super::value::{FieldTable, FieldValue, tag};
use chrono::DateTime;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

/// Size of the fixed frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 24;

/// Maximum size of a single frame, header included.
///
/// Messages with larger encodings are fragmented across multiple frames.
pub const MAX_FRAME_SIZE: u32 = 2 * 1024 * 1024;

/// Maximum size of a fully reassembled message payload.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Maximum number of concurrently reassembling messages.
///
/// When the table is full the stalest partial is evicted; an abandoned
/// fragment sequence therefore ages out instead of leaking.
pub const MAX_PARTIAL_MESSAGES: usize = 16;

/// Maximum nesting depth for array sub-blocks.
pub const MAX_NESTING_DEPTH: usize = 8;

/// A single wire frame: header fields plus an opaque payload slice.
///
/// For unfragmented messages the payload is the full field record
/// sequence; for fragments it is an arbitrary byte range of it.
#[derive(Debug, Clone)]
pub struct Frame {
    code: MessageCode,
    flags: u16,
    request_id: u64,
    sequence: u32,
    field_count: u32,
    payload: Vec<u8>,
}

impl Frame {
    /// Creates a frame from its parts.
    #[must_use]
    pub fn new(
        code: MessageCode,
        flags: u16,
        request_id: u64,
        sequence: u32,
        field_count: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            code,
            flags,
            request_id,
            sequence,
            field_count,
            payload,
        }
    }

    /// Returns the message code.
    #[must_use]
    pub const fn code(&self) -> MessageCode {
        self.code
    }

    /// Returns the header flags.
    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Returns the fragment sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the declared field count (meaningful on the first frame of
    /// a message only).
    #[must_use]
    pub const fn field_count(&self) -> u32 {
        self.field_count
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns `true` if this frame is a fragment of a larger message.
    #[must_use]
    pub const fn is_fragment(&self) -> bool {
        self.flags & flags::FRAGMENT != 0
    }

    /// Encodes the frame into its wire representation.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let total = FRAME_HEADER_SIZE + self.payload.len();
        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(&(total as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code.raw().to_be_bytes());
        bytes.extend_from_slice(&self.flags.to_be_bytes());
        bytes.extend_from_slice(&self.request_id.to_be_bytes());
        bytes.extend_from_slice(&self.sequence.to_be_bytes());
        bytes.extend_from_slice(&self.field_count.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Reads one frame from an async reader.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTooLarge`] if the length header
    /// exceeds [`MAX_FRAME_SIZE`], [`ProtocolError::Truncated`] if it is
    /// smaller than the fixed header, and [`ProtocolError::Io`] if the
    /// underlying read fails (including end of stream).
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes).await?;
        let total = u32::from_be_bytes(len_bytes);

        if total > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: total as usize,
                limit: MAX_FRAME_SIZE as usize,
            });
        }
        if (total as usize) < FRAME_HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                expected: FRAME_HEADER_SIZE,
                actual: total as usize,
            });
        }

        let mut rest = vec![0u8; total as usize - 4];
        reader.read_exact(&mut rest).await?;

        let code = MessageCode::new(u16::from_be_bytes([rest[0], rest[1]]));
        let frame_flags = u16::from_be_bytes([rest[2], rest[3]]);
        let request_id = u64::from_be_bytes(rest[4..12].try_into().expect("fixed slice"));
        let sequence = u32::from_be_bytes(rest[12..16].try_into().expect("fixed slice"));
        let field_count = u32::from_be_bytes(rest[16..20].try_into().expect("fixed slice"));
        let payload = rest.split_off(20);

        Ok(Self {
            code,
            flags: frame_flags,
            request_id,
            sequence,
            field_count,
            payload,
        })
    }

    /// Writes this frame to an async writer without flushing.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Io`] if the write fails.
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await?;
        Ok(())
    }
}

/// Encodes a message into one or more frames.
///
/// Messages whose payload fits in a single frame produce exactly one
/// unflagged frame; larger messages are split into `FRAGMENT` frames with
/// consecutive sequence numbers, the last one also carrying
/// `LAST_FRAGMENT`. The declared field count travels on the first frame.
///
/// # Errors
///
/// Returns [`ProtocolError::NestingTooDeep`] if array sub-blocks exceed
/// [`MAX_NESTING_DEPTH`], or [`ProtocolError::FrameTooLarge`] if the
/// total encoding exceeds [`MAX_MESSAGE_SIZE`].
pub fn encode(message: &Message) -> Result<Vec<Frame>, ProtocolError> {
    let payload = encode_fields(message.fields(), 0)?;
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            limit: MAX_MESSAGE_SIZE,
        });
    }

    let base_flags = message.flags() & !(flags::FRAGMENT | flags::LAST_FRAGMENT);
    let field_count = message.field_count() as u32;
    let max_payload = MAX_FRAME_SIZE as usize - FRAME_HEADER_SIZE;

    if payload.len() <= max_payload {
        return Ok(vec![Frame::new(
            message.code(),
            base_flags,
            message.request_id(),
            0,
            field_count,
            payload,
        )]);
    }

    let chunks: Vec<&[u8]> = payload.chunks(max_payload).collect();
    let last = chunks.len() - 1;
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut frame_flags = base_flags | flags::FRAGMENT;
            if index == last {
                frame_flags |= flags::LAST_FRAGMENT;
            }
            Frame::new(
                message.code(),
                frame_flags,
                message.request_id(),
                index as u32,
                if index == 0 { field_count } else { 0 },
                chunk.to_vec(),
            )
        })
        .collect())
}

/// Encodes a message and writes all of its frames to an async writer,
/// flushing once at the end.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if writing fails, or any encoding error
/// from [`encode`].
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    for frame in encode(message)? {
        frame.write_to(writer).await?;
    }
    writer.flush().await?;
    Ok(())
}

fn encode_fields(table: &FieldTable, depth: usize) -> Result<Vec<u8>, ProtocolError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ProtocolError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }

    let mut out = Vec::new();
    for (code, value) in table {
        out.extend_from_slice(&code.to_be_bytes());
        out.push(value.type_tag());
        match value {
            FieldValue::Int32(v) => out.extend_from_slice(&v.to_be_bytes()),
            FieldValue::Int64(v) => out.extend_from_slice(&v.to_be_bytes()),
            FieldValue::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            FieldValue::String(v) => {
                out.extend_from_slice(&(v.len() as u32).to_be_bytes());
                out.extend_from_slice(v.as_bytes());
            }
            FieldValue::Binary(v) => {
                out.extend_from_slice(&(v.len() as u32).to_be_bytes());
                out.extend_from_slice(v);
            }
            FieldValue::Uuid(v) => out.extend_from_slice(v.as_bytes()),
            FieldValue::Timestamp(v) => out.extend_from_slice(&v.timestamp().to_be_bytes()),
            FieldValue::Array(blocks) => {
                out.extend_from_slice(&(blocks.len() as u32).to_be_bytes());
                for block in blocks {
                    out.extend_from_slice(&(block.len() as u32).to_be_bytes());
                    out.extend_from_slice(&encode_fields(block, depth + 1)?);
                }
            }
        }
    }
    Ok(out)
}

/// Decodes a complete (defragmented) payload into a message.
pub(crate) fn decode_message(
    code: MessageCode,
    frame_flags: u16,
    request_id: u64,
    field_count: u32,
    payload: &[u8],
) -> Result<Message, ProtocolError> {
    let mut reader = PayloadReader::new(payload);
    let fields = decode_fields(&mut reader, field_count, 0)?;
    if reader.remaining() != 0 {
        return Err(ProtocolError::Truncated {
            expected: reader.position(),
            actual: payload.len(),
        });
    }
    Ok(Message::from_parts(
        code,
        frame_flags & !(flags::FRAGMENT | flags::LAST_FRAGMENT),
        request_id,
        fields,
    ))
}

fn decode_fields(
    reader: &mut PayloadReader<'_>,
    count: u32,
    depth: usize,
) -> Result<FieldTable, ProtocolError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ProtocolError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }

    let mut table = FieldTable::new();
    for _ in 0..count {
        let (code, value) = decode_record(reader, depth)?;
        table.insert(code, value);
    }
    Ok(table)
}

fn decode_record(
    reader: &mut PayloadReader<'_>,
    depth: usize,
) -> Result<(u32, FieldValue), ProtocolError> {
    let code = reader.read_u32()?;
    let type_tag = reader.read_u8()?;
    let value = match type_tag {
        tag::INT32 => FieldValue::Int32(reader.read_u32()? as i32),
        tag::INT64 => FieldValue::Int64(reader.read_u64()? as i64),
        tag::FLOAT => FieldValue::Float(f64::from_bits(reader.read_u64()?)),
        tag::STRING => {
            let len = reader.read_u32()? as usize;
            let bytes = reader.read_bytes(len, code)?;
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|_| ProtocolError::InvalidUtf8 { field: code })?;
            FieldValue::String(text)
        }
        tag::BINARY => {
            let len = reader.read_u32()? as usize;
            FieldValue::Binary(reader.read_bytes(len, code)?.to_vec())
        }
        tag::UUID => {
            let bytes: [u8; 16] = reader
                .read_bytes(16, code)?
                .try_into()
                .expect("fixed slice");
            FieldValue::Uuid(Uuid::from_bytes(bytes))
        }
        tag::TIMESTAMP => {
            let seconds = reader.read_u64()? as i64;
            let when = DateTime::from_timestamp(seconds, 0)
                .ok_or(ProtocolError::InvalidValue { field: code })?;
            FieldValue::Timestamp(when)
        }
        tag::ARRAY => {
            let block_count = reader.read_u32()? as usize;
            // Each block needs at least its own field count header.
            if block_count > reader.remaining() / 4 + 1 {
                return Err(ProtocolError::LengthMismatch { field: code });
            }
            let mut blocks = Vec::with_capacity(block_count.min(1024));
            for _ in 0..block_count {
                let field_count = reader.read_u32()?;
                blocks.push(decode_fields(reader, field_count, depth + 1)?);
            }
            FieldValue::Array(blocks)
        }
        other => {
            return Err(ProtocolError::UnknownTypeTag {
                field: code,
                tag: other,
            });
        }
    };
    Ok((code, value))
}

/// Sequential reader over a payload slice with bounds-checked accessors.
struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < len {
            return Err(ProtocolError::Truncated {
                expected: self.pos + len,
                actual: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(
            self.take(4)?.try_into().expect("fixed slice"),
        ))
    }

    fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        Ok(u64::from_be_bytes(
            self.take(8)?.try_into().expect("fixed slice"),
        ))
    }

    fn read_bytes(&mut self, len: usize, field: u32) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < len {
            return Err(ProtocolError::LengthMismatch { field });
        }
        self.take(len)
    }
}

/// Reassembles fragmented messages from a stream of frames.
///
/// Partial messages are keyed by request id. Out-of-order fragments fail
/// the whole sequence, and both the number of concurrent partials and the
/// accumulated payload size are bounded.
#[derive(Debug, Default)]
pub struct Reassembler {
    partials: HashMap<u64, Partial>,
    stamp: u64,
}

#[derive(Debug)]
struct Partial {
    code: MessageCode,
    flags: u16,
    field_count: u32,
    next_sequence: u32,
    buf: Vec<u8>,
    touched: u64,
}

impl Reassembler {
    /// Creates an empty reassembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of messages currently being reassembled.
    #[must_use]
    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    /// Feeds one frame in, returning a complete message when one becomes
    /// available.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FragmentOutOfOrder`] for a fragment whose
    /// sequence does not continue its partial (the partial is discarded),
    /// [`ProtocolError::ReassemblyOverflow`] when a partial outgrows
    /// [`MAX_MESSAGE_SIZE`], or any decoding error once the final fragment
    /// arrives.
    pub fn push(&mut self, frame: Frame) -> Result<Option<Message>, ProtocolError> {
        if !frame.is_fragment() {
            return decode_message(
                frame.code,
                frame.flags,
                frame.request_id,
                frame.field_count,
                &frame.payload,
            )
            .map(Some);
        }

        let request_id = frame.request_id;
        let last = frame.flags & flags::LAST_FRAGMENT != 0;

        if frame.sequence == 0 {
            if self.partials.remove(&request_id).is_some() {
                warn!(request_id, "discarding restarted fragment sequence");
            }
            if last {
                // Degenerate single-fragment message.
                return decode_message(
                    frame.code,
                    frame.flags,
                    request_id,
                    frame.field_count,
                    &frame.payload,
                )
                .map(Some);
            }
            self.evict_if_full();
            self.stamp += 1;
            self.partials.insert(
                request_id,
                Partial {
                    code: frame.code,
                    flags: frame.flags,
                    field_count: frame.field_count,
                    next_sequence: 1,
                    buf: frame.payload,
                    touched: self.stamp,
                },
            );
            return Ok(None);
        }

        let Some(partial) = self.partials.get_mut(&request_id) else {
            return Err(ProtocolError::FragmentOutOfOrder {
                request_id,
                expected: 0,
                received: frame.sequence,
            });
        };

        if frame.sequence != partial.next_sequence || frame.code != partial.code {
            let expected = partial.next_sequence;
            self.partials.remove(&request_id);
            return Err(ProtocolError::FragmentOutOfOrder {
                request_id,
                expected,
                received: frame.sequence,
            });
        }

        partial.buf.extend_from_slice(&frame.payload);
        if partial.buf.len() > MAX_MESSAGE_SIZE {
            self.partials.remove(&request_id);
            return Err(ProtocolError::ReassemblyOverflow {
                request_id,
                limit: MAX_MESSAGE_SIZE,
            });
        }
        partial.next_sequence += 1;
        self.stamp += 1;
        partial.touched = self.stamp;

        if last {
            let partial = self.partials.remove(&request_id).expect("partial present");
            return decode_message(
                partial.code,
                partial.flags,
                request_id,
                partial.field_count,
                &partial.buf,
            )
            .map(Some);
        }
        Ok(None)
    }

    /// Evicts the stalest partial when the table is full.
    fn evict_if_full(&mut self) {
        if self.partials.len() < MAX_PARTIAL_MESSAGES {
            return;
        }
        if let Some(stalest) = self
            .partials
            .iter()
            .min_by_key(|(_, partial)| partial.touched)
            .map(|(id, _)| *id)
        {
            self.partials.remove(&stalest);
            warn!(request_id = stalest, "evicting abandoned fragment sequence");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{codes, fields};
    use chrono::DateTime;

    fn sample_message() -> Message {
        let mut msg = Message::new(codes::OBJECT, 7);
        msg.set_i32(fields::OBJECT_STATUS, -3);
        msg.set_u64(fields::OBJECT_ID, u64::MAX - 1);
        msg.set_f64(fields::FREQUENCY, 868.1);
        msg.set_string(fields::OBJECT_NAME, "sensor-\0-binary-safe");
        msg.set_binary(fields::MAC_ADDRESS, vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        msg.set_uuid(fields::OBJECT_GUID, Uuid::from_u128(0x1234_5678_9ABC_DEF0));
        msg.set_timestamp(
            fields::LAST_CONNECTION,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        );
        msg.set_id_list(fields::CHILD_LIST, &[1, 2, 3]);
        msg
    }

    fn round_trip(msg: &Message) -> Message {
        let frames = encode(msg).unwrap();
        let mut reassembler = Reassembler::new();
        let mut result = None;
        for frame in frames {
            if let Some(decoded) = reassembler.push(frame).unwrap() {
                result = Some(decoded);
            }
        }
        result.expect("message should complete")
    }

    #[test]
    fn test_round_trip_all_field_types() {
        let msg = sample_message();
        let decoded = round_trip(&msg);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_round_trip_empty_message() {
        let msg = Message::new(codes::KEEPALIVE, 0);
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_small_message_is_single_frame() {
        let frames = encode(&sample_message()).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].is_fragment());
    }

    #[test]
    fn test_large_message_fragments_and_reassembles() {
        let mut msg = Message::new(codes::REQUEST_COMPLETED, 42);
        msg.set_binary(fields::CHALLENGE, vec![0xA5u8; 3 * 1024 * 1024]);

        let frames = encode(&msg).unwrap();
        assert!(frames.len() > 1);
        assert!(frames.iter().all(Frame::is_fragment));
        assert_eq!(
            frames.last().unwrap().flags() & flags::LAST_FRAGMENT,
            flags::LAST_FRAGMENT
        );
        // Consecutive sequence numbers from zero.
        for (index, frame) in frames.iter().enumerate() {
            assert_eq!(frame.sequence(), index as u32);
        }

        let mut reassembler = Reassembler::new();
        let mut decoded = None;
        for frame in frames {
            decoded = reassembler.push(frame).unwrap();
        }
        assert_eq!(decoded.unwrap(), msg);
        assert_eq!(reassembler.partial_count(), 0);
    }

    #[test]
    fn test_out_of_order_fragment_fails_sequence() {
        let mut msg = Message::new(codes::REQUEST_COMPLETED, 5);
        msg.set_binary(fields::CHALLENGE, vec![0u8; 5 * 1024 * 1024]);
        let mut frames = encode(&msg).unwrap();
        assert!(frames.len() >= 3);

        let mut reassembler = Reassembler::new();
        assert!(reassembler.push(frames.remove(0)).unwrap().is_none());
        // Skip one fragment.
        let skipped = frames.remove(1);
        let err = reassembler.push(skipped).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FragmentOutOfOrder {
                request_id: 5,
                expected: 1,
                received: 2,
            }
        ));
        // The partial is gone; the original fragment 1 now has no sequence.
        let err = reassembler.push(frames.remove(0)).unwrap_err();
        assert!(matches!(err, ProtocolError::FragmentOutOfOrder { .. }));
        assert_eq!(reassembler.partial_count(), 0);
    }

    #[test]
    fn test_partial_table_evicts_stalest() {
        let mut reassembler = Reassembler::new();
        for id in 0..MAX_PARTIAL_MESSAGES as u64 + 1 {
            let frame = Frame::new(
                codes::REQUEST_COMPLETED,
                flags::FRAGMENT,
                id + 1,
                0,
                1,
                vec![0u8; 8],
            );
            assert!(reassembler.push(frame).unwrap().is_none());
        }
        assert_eq!(reassembler.partial_count(), MAX_PARTIAL_MESSAGES);
        // The first (stalest) sequence was evicted.
        let next = Frame::new(
            codes::REQUEST_COMPLETED,
            flags::FRAGMENT | flags::LAST_FRAGMENT,
            1,
            1,
            0,
            Vec::new(),
        );
        assert!(matches!(
            reassembler.push(next),
            Err(ProtocolError::FragmentOutOfOrder { request_id: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_type_tag_rejected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&fields::OBJECT_NAME.to_be_bytes());
        payload.push(0xEE);
        let err = decode_message(codes::OBJECT, 0, 0, 1, &payload).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnknownTypeTag { tag: 0xEE, .. }
        ));
    }

    #[test]
    fn test_string_length_overrun_rejected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&fields::OBJECT_NAME.to_be_bytes());
        payload.push(tag::STRING);
        payload.extend_from_slice(&100u32.to_be_bytes());
        payload.extend_from_slice(b"short");
        let err = decode_message(codes::OBJECT, 0, 0, 1, &payload).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::LengthMismatch {
                field: fields::OBJECT_NAME
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&fields::OBJECT_NAME.to_be_bytes());
        payload.push(tag::STRING);
        payload.extend_from_slice(&2u32.to_be_bytes());
        payload.extend_from_slice(&[0xFF, 0xFE]);
        let err = decode_message(codes::OBJECT, 0, 0, 1, &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut msg = Message::new(codes::OBJECT, 0);
        msg.set_i32(fields::OBJECT_STATUS, 1);
        let frames = encode(&msg).unwrap();
        let mut payload = frames[0].payload().to_vec();
        payload.push(0x00);
        let err = decode_message(codes::OBJECT, 0, 0, 1, &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[test]
    fn test_declared_fields_missing_rejected() {
        let err = decode_message(codes::OBJECT, 0, 0, 3, &[]).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[tokio::test]
    async fn test_frame_read_write_round_trip() {
        let msg = sample_message();
        let mut buffer = Vec::new();
        write_message(&mut buffer, &msg).await.unwrap();

        let mut reader = &buffer[..];
        let frame = Frame::read_from(&mut reader).await.unwrap();
        assert_eq!(frame.code(), codes::OBJECT);
        assert_eq!(frame.request_id(), 7);

        let decoded = Reassembler::new().push(frame).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }

    #[tokio::test]
    async fn test_oversized_length_header_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_SIZE + 1).to_be_bytes());
        let mut reader = &buffer[..];
        let err = Frame::read_from(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_undersized_length_header_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&8u32.to_be_bytes());
        buffer.extend_from_slice(&[0u8; 4]);
        let mut reader = &buffer[..];
        let err = Frame::read_from(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[tokio::test]
    async fn test_truncated_stream_is_io_error() {
        let msg = sample_message();
        let mut buffer = Vec::new();
        write_message(&mut buffer, &msg).await.unwrap();
        buffer.truncate(buffer.len() - 3);

        let mut reader = &buffer[..];
        let err = Frame::read_from(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Io { .. }));
        assert!(!err.is_frame_local());
    }
}
