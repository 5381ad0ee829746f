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

//! The transport channel: socket lifecycle, framing, serialized writes.
//!
//! A [`Connection`] is established once per session and never reconnects.
//! After the preamble (and optional TLS handshake) the stream is split:
//! the write half is owned by a single writer task draining an outbound
//! queue, so messages from any number of concurrent senders reach the
//! wire one whole frame at a time; the read half is returned to the
//! session as a [`MessageReader`] pumped by the session's receive task.

use super::error::TransportError;
use super::preamble;
use super::tls::{EncryptionMode, SocketStream, build_connector, server_name};
use crate::protocol::codec::{Frame, Reassembler, write_message};
use crate::protocol::{Message, ProtocolError};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Depth of the outbound message queue.
const OUTBOUND_QUEUE_SIZE: usize = 64;

/// An established connection to an Argus server.
///
/// `send` may be called from any number of concurrent tasks; frames are
/// serialized by the writer task. [`Connection::close`] is idempotent and
/// wakes blocked senders with [`TransportError::Closed`] instead of
/// letting them hang.
#[derive(Debug)]
pub struct Connection {
    outbound: mpsc::Sender<Message>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    writer_task: JoinHandle<()>,
    peer_addr: SocketAddr,
    encrypted: bool,
}

impl Connection {
    /// Connects to `address` (`host:port`), runs the preamble exchange,
    /// and performs the TLS handshake when encryption is negotiated.
    ///
    /// Returns the connection plus the [`MessageReader`] for the
    /// session's receive task. Only one connect attempt exists per
    /// session; a failed connect is reported to the caller, never retried
    /// internally.
    ///
    /// # Errors
    ///
    /// - [`TransportError::ConnectionFailed`] if the TCP connect fails
    /// - [`TransportError::NegotiationFailed`] if the peer is not an
    ///   Argus server
    /// - [`TransportError::EncryptionUnavailable`] if encryption was
    ///   requested and the server refused it
    /// - [`TransportError::TlsFailed`] if the TLS handshake fails
    pub async fn connect(
        address: &str,
        encryption: &EncryptionMode,
    ) -> Result<(Self, MessageReader), TransportError> {
        let stream = TcpStream::connect(address).await.map_err(|source| {
            TransportError::ConnectionFailed {
                address: address.to_string(),
                source,
            }
        })?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;

        let mut stream = stream;
        let use_tls = preamble::negotiate(&mut stream, encryption.is_enabled()).await?;

        let stream = if use_tls {
            let EncryptionMode::Enabled(options) = encryption else {
                // negotiate() only reports TLS when it was requested.
                return Err(TransportError::NegotiationFailed {
                    reason: "server accepted encryption that was not requested".to_string(),
                });
            };
            let host = address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or(address);
            let connector = build_connector(options)?;
            let name = server_name(host)?;
            let tls_stream = connector
                .connect(name, stream)
                .await
                .map_err(|source| TransportError::TlsFailed { source })?;
            SocketStream::Tls(Box::new(tls_stream))
        } else {
            SocketStream::Plain(stream)
        };

        info!(peer = %peer_addr, encrypted = use_tls, "connection established");

        let (read_half, write_half) = tokio::io::split(stream);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());

        let writer_task = tokio::spawn(run_writer(
            write_half,
            outbound_rx,
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        let connection = Self {
            outbound: outbound_tx,
            closed: Arc::clone(&closed),
            shutdown,
            writer_task,
            peer_addr,
            encrypted: use_tls,
        };
        let reader = MessageReader {
            read_half,
            reassembler: Reassembler::new(),
        };
        Ok((connection, reader))
    }

    /// Queues a message for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the channel has been closed.
    pub async fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Closes the channel.
    ///
    /// Idempotent. The writer task shuts the socket down; senders blocked
    /// on a full outbound queue are woken with
    /// [`TransportError::Closed`].
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(peer = %self.peer_addr, "closing connection");
            // Wake a waiting writer task, and leave a permit in case it
            // has not reached its wait point yet.
            self.shutdown.notify_waiters();
            self.shutdown.notify_one();
        }
    }

    /// Returns `true` once the channel is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the server's socket address.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Returns `true` if the connection is TLS-encrypted.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.writer_task.abort();
    }
}

/// Writer task: drains the outbound queue onto the wire, one message at
/// a time.
async fn run_writer(
    mut write_half: WriteHalf<SocketStream>,
    mut outbound_rx: mpsc::Receiver<Message>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            maybe = outbound_rx.recv() => match maybe {
                Some(message) => {
                    if let Err(e) = write_message(&mut write_half, &message).await {
                        warn!(error = %e, "write failed, closing channel");
                        break;
                    }
                }
                None => break,
            },
            _ = shutdown.notified() => break,
        }
    }
    closed.store(true, Ordering::Release);
    let _ = write_half.shutdown().await;
}

/// The read half of a connection, yielding fully reassembled messages.
///
/// Owned by the session's receive task, the single consumer of incoming
/// messages.
#[derive(Debug)]
pub struct MessageReader {
    read_half: ReadHalf<SocketStream>,
    reassembler: Reassembler,
}

impl MessageReader {
    /// Reads the next complete message.
    ///
    /// Returns `Ok(None)` once the channel is closed (peer disconnect,
    /// I/O failure, or an unrecoverable framing error that desynchronizes
    /// the stream). A frame-local decode error is returned as `Err`; the
    /// caller logs it, drops the frame, and keeps calling `next`.
    pub async fn next(&mut self) -> Result<Option<Message>, ProtocolError> {
        loop {
            let frame = match Frame::read_from(&mut self.read_half).await {
                Ok(frame) => frame,
                Err(ProtocolError::Io { source })
                    if source.kind() == io::ErrorKind::UnexpectedEof =>
                {
                    debug!("peer closed the connection");
                    return Ok(None);
                }
                Err(ProtocolError::Io { source }) => {
                    warn!(error = %source, "read failed, closing channel");
                    return Ok(None);
                }
                Err(e) => {
                    // A bad length header loses the frame boundary; the
                    // stream cannot be resynchronized safely.
                    error!(error = %e, "unrecoverable framing error, closing channel");
                    return Ok(None);
                }
            };

            match self.reassembler.push(frame) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{codes, fields};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Accepts one connection, answers the preamble, and echoes decoded
    /// messages back verbatim.
    async fn spawn_echo_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut hello = [0u8; preamble::PREAMBLE_SIZE];
            stream.read_exact(&mut hello).await.unwrap();
            let mut reply = [0u8; preamble::PREAMBLE_SIZE];
            reply[..4].copy_from_slice(&preamble::PREAMBLE_MAGIC);
            reply[4..6].copy_from_slice(&preamble::PREAMBLE_VERSION.to_be_bytes());
            stream.write_all(&reply).await.unwrap();

            let (mut read_half, mut write_half) = stream.into_split();
            let mut reassembler = Reassembler::new();
            while let Ok(frame) = Frame::read_from(&mut read_half).await {
                if let Ok(Some(message)) = reassembler.push(frame) {
                    if write_message(&mut write_half, &message).await.is_err() {
                        break;
                    }
                }
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_connect_send_receive() {
        let addr = spawn_echo_server().await;
        let (connection, mut reader) =
            Connection::connect(&addr.to_string(), &EncryptionMode::Disabled)
                .await
                .unwrap();
        assert!(!connection.is_encrypted());

        let mut message = Message::new(codes::NOTIFY, 0);
        message.set_u32(fields::NOTIFY_CODE, 17);
        connection.send(message.clone()).await.unwrap();

        let echoed = reader.next().await.unwrap().unwrap();
        assert_eq!(echoed, message);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_fails_senders() {
        let addr = spawn_echo_server().await;
        let (connection, mut reader) =
            Connection::connect(&addr.to_string(), &EncryptionMode::Disabled)
                .await
                .unwrap();

        connection.close();
        connection.close();
        assert!(connection.is_closed());

        let err = connection
            .send(Message::new(codes::NOTIFY, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Closed));

        // The peer sees our shutdown and closes; the reader drains to None.
        assert!(reader.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let err = Connection::connect("127.0.0.1:1", &EncryptionMode::Disabled)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
        assert!(err.is_recoverable());
    }
}
