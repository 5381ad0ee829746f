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

//! Shared test support: a scripted mock server speaking the real codec
//! over TCP.

#![allow(dead_code)]

use argus_client::protocol::{
    Frame, Message, PROTOCOL_VERSION, Reassembler, codes, fields, rcc, write_message,
};
use argus_client::transport::{PREAMBLE_MAGIC, PREAMBLE_SIZE, PREAMBLE_VERSION};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Server version string reported by the mock.
pub const SERVER_VERSION: &str = "5.1.2";

/// Server id reported by the mock.
pub const SERVER_ID: Uuid = Uuid::from_u128(0x00C0_FFEE_0000_0000_0000_0000_0000_0042);

enum ServerCommand {
    Push(Message),
    Close,
}

/// A single-connection mock server.
///
/// Accepts one client, answers the preamble (always refusing TLS), and
/// feeds decoded requests to the scripted responder. Spontaneous pushes
/// and a hard close can be injected at any time.
pub struct MockServer {
    address: String,
    commands: mpsc::UnboundedSender<ServerCommand>,
}

impl MockServer {
    /// Spawns a mock server with the given request responder.
    pub async fn spawn<F>(mut responder: F) -> Self
    where
        F: FnMut(&Message) -> Vec<Message> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = stream;

            // Preamble: valid answer, TLS always refused.
            let mut hello = [0u8; PREAMBLE_SIZE];
            stream.read_exact(&mut hello).await.unwrap();
            assert_eq!(&hello[..4], &PREAMBLE_MAGIC);
            let mut reply = [0u8; PREAMBLE_SIZE];
            reply[..4].copy_from_slice(&PREAMBLE_MAGIC);
            reply[4..6].copy_from_slice(&PREAMBLE_VERSION.to_be_bytes());
            stream.write_all(&reply).await.unwrap();

            let (mut read_half, mut write_half) = stream.into_split();
            let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

            let writer = tokio::spawn(async move {
                while let Some(message) = out_rx.recv().await {
                    if write_message(&mut write_half, &message).await.is_err() {
                        break;
                    }
                }
            });

            let responder_out = out_tx.clone();
            let reader = tokio::spawn(async move {
                let mut reassembler = Reassembler::new();
                while let Ok(frame) = Frame::read_from(&mut read_half).await {
                    if let Ok(Some(request)) = reassembler.push(frame) {
                        for response in responder(&request) {
                            if responder_out.send(response).is_err() {
                                return;
                            }
                        }
                    }
                }
            });

            while let Some(command) = command_rx.recv().await {
                match command {
                    ServerCommand::Push(message) => {
                        let _ = out_tx.send(message);
                    }
                    ServerCommand::Close => break,
                }
            }
            // Dropping both halves closes the socket under the client.
            reader.abort();
            writer.abort();
        });

        Self {
            address,
            commands: command_tx,
        }
    }

    /// Returns the `host:port` address of the server.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Injects a spontaneous server push.
    pub fn push(&self, message: Message) {
        let _ = self.commands.send(ServerCommand::Push(message));
    }

    /// Drops the connection.
    pub fn close(&self) {
        let _ = self.commands.send(ServerCommand::Close);
    }
}

/// Builds a successful login reply for `request`.
pub fn login_reply(request: &Message, code: u32) -> Message {
    let mut reply = Message::new(codes::LOGIN_REPLY, request.request_id());
    reply.set_u32(fields::RESULT_CODE, code);
    reply.set_u32(fields::PROTOCOL_VERSION, PROTOCOL_VERSION);
    reply.set_string(fields::SERVER_VERSION, SERVER_VERSION);
    reply.set_uuid(fields::SERVER_ID, SERVER_ID);
    reply
}

/// Builds a bare success reply for `request`.
pub fn completed(request: &Message) -> Message {
    let mut reply = Message::new(codes::REQUEST_COMPLETED, request.request_id());
    reply.set_u32(fields::RESULT_CODE, rcc::SUCCESS);
    reply
}

/// Builds an object push with the given id and name.
pub fn object_push(id: u64, name: &str) -> Message {
    let mut msg = Message::new(codes::OBJECT, 0);
    msg.set_u64(fields::OBJECT_ID, id);
    msg.set_string(fields::OBJECT_NAME, name);
    msg
}

/// Builds an object update push carrying only the given fields.
pub fn object_update(id: u64) -> Message {
    let mut msg = Message::new(codes::OBJECT_UPDATE, 0);
    msg.set_u64(fields::OBJECT_ID, id);
    msg
}

/// A responder handling login, object synchronization, and password
/// changes; anything else gets a bare success reply.
pub fn standard_responder(
    initial_objects: Vec<Message>,
) -> impl FnMut(&Message) -> Vec<Message> + Send + 'static {
    move |request| match request.code() {
        codes::LOGIN => vec![login_reply(request, rcc::SUCCESS)],
        codes::GET_OBJECTS => {
            let mut responses = initial_objects.clone();
            let mut done = Message::new(codes::OBJECT_SYNC_DONE, request.request_id());
            done.set_u32(fields::RESULT_CODE, rcc::SUCCESS);
            responses.push(done);
            responses
        }
        _ => vec![completed(request)],
    }
}

/// Polls `predicate` until it holds or `deadline_ms` elapses.
pub async fn wait_until(deadline_ms: u64, predicate: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(deadline_ms);
    loop {
        if predicate() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
