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

//! Integration tests for the login state machine.

mod common;

use argus_client::protocol::{Message, codes, fields, rcc};
use argus_client::session::{ChallengeSigner, SignatureError};
use argus_client::{
    Credentials, EncryptionMode, Session, SessionConfig, SessionError, SessionState, TlsOptions,
};
use common::{MockServer, completed, login_reply, object_push, standard_responder};
use std::sync::Arc;

fn password_config(address: &str) -> SessionConfig {
    SessionConfig::new(address, Credentials::password("operator", "secret"))
}

#[tokio::test]
async fn test_login_reaches_ready_with_synchronized_snapshot() {
    let server = MockServer::spawn(standard_responder(vec![
        object_push(1, "core-router"),
        object_push(2, "edge-switch"),
    ]))
    .await;

    let session = Session::connect(password_config(server.address()))
        .await
        .unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    assert!(!session.password_expired());
    assert_eq!(session.server_version(), Some(common::SERVER_VERSION));
    assert_eq!(session.server_id(), Some(common::SERVER_ID));

    let objects = session.objects();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].id, 1);
    assert_eq!(objects[0].name, "core-router");
    assert_eq!(session.object(2).unwrap().name, "edge-switch");

    session.disconnect().await;
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_access_denied() {
    let server = MockServer::spawn(|request: &Message| match request.code() {
        codes::LOGIN => vec![login_reply(request, rcc::ACCESS_DENIED)],
        _ => vec![completed(request)],
    })
    .await;

    let err = Session::connect(password_config(server.address()))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::AccessDenied));
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_password_expired_still_reaches_ready() {
    let server = MockServer::spawn(|request: &Message| match request.code() {
        codes::LOGIN => vec![login_reply(request, rcc::PASSWORD_EXPIRED)],
        codes::GET_OBJECTS => {
            let mut done = Message::new(codes::OBJECT_SYNC_DONE, request.request_id());
            done.set_u32(fields::RESULT_CODE, rcc::SUCCESS);
            vec![done]
        }
        _ => vec![completed(request)],
    })
    .await;

    let session = Session::connect(password_config(server.address()))
        .await
        .unwrap();

    // Non-fatal: the session is usable and the status is visible.
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.password_expired());

    // The password-change flow clears the status.
    session.change_password("correct horse").await.unwrap();
    assert!(!session.password_expired());

    session.disconnect().await;
}

#[tokio::test]
async fn test_protocol_version_mismatch_is_fatal() {
    let responder = |request: &Message| match request.code() {
        codes::LOGIN => {
            let mut reply = login_reply(request, rcc::SUCCESS);
            reply.set_u32(fields::PROTOCOL_VERSION, 99);
            vec![reply]
        }
        _ => vec![completed(request)],
    };

    let server = MockServer::spawn(responder).await;
    let err = Session::connect(password_config(server.address()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::ProtocolVersionMismatch {
            server: 99,
            client: _
        }
    ));
}

#[tokio::test]
async fn test_protocol_version_mismatch_can_be_ignored() {
    let responder = |request: &Message| match request.code() {
        codes::LOGIN => {
            let mut reply = login_reply(request, rcc::SUCCESS);
            reply.set_u32(fields::PROTOCOL_VERSION, 99);
            vec![reply]
        }
        codes::GET_OBJECTS => {
            let mut done = Message::new(codes::OBJECT_SYNC_DONE, request.request_id());
            done.set_u32(fields::RESULT_CODE, rcc::SUCCESS);
            vec![done]
        }
        _ => vec![completed(request)],
    };

    let server = MockServer::spawn(responder).await;
    let session = Session::connect(
        password_config(server.address()).ignore_protocol_version(),
    )
    .await
    .unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    session.disconnect().await;
}

#[tokio::test]
async fn test_encryption_refusal_surfaces_and_fallback_is_explicit() {
    // The mock server always refuses TLS in the preamble.
    let server = MockServer::spawn(standard_responder(Vec::new())).await;
    let config = password_config(server.address())
        .with_encryption(EncryptionMode::Enabled(TlsOptions::new()));

    let err = Session::connect(config).await.unwrap_err();
    assert!(err.is_encryption_unavailable());

    // Retrying without encryption is an explicit caller decision.
    let server = MockServer::spawn(standard_responder(Vec::new())).await;
    let session = Session::connect(password_config(server.address()))
        .await
        .unwrap();
    assert!(!session.is_encrypted());
    session.disconnect().await;
}

struct ReversingSigner;

impl ChallengeSigner for ReversingSigner {
    fn certificate(&self) -> &[u8] {
        b"test-certificate"
    }

    fn sign(&self, challenge: &[u8]) -> Result<Vec<u8>, SignatureError> {
        Ok(challenge.iter().rev().copied().collect())
    }
}

#[tokio::test]
async fn test_certificate_login_challenge_round() {
    const CHALLENGE: &[u8] = b"0123456789abcdef";

    let server = MockServer::spawn(|request: &Message| match request.code() {
        codes::GET_CHALLENGE => {
            let mut reply = completed(request);
            reply.set_binary(fields::CHALLENGE, CHALLENGE.to_vec());
            vec![reply]
        }
        codes::LOGIN => {
            let expected: Vec<u8> = CHALLENGE.iter().rev().copied().collect();
            let signature_ok = request.get_binary(fields::SIGNATURE) == Some(expected.as_slice());
            let certificate_ok =
                request.get_binary(fields::CERTIFICATE) == Some(b"test-certificate".as_slice());
            let code = if signature_ok && certificate_ok {
                rcc::SUCCESS
            } else {
                rcc::ACCESS_DENIED
            };
            vec![login_reply(request, code)]
        }
        codes::GET_OBJECTS => {
            let mut done = Message::new(codes::OBJECT_SYNC_DONE, request.request_id());
            done.set_u32(fields::RESULT_CODE, rcc::SUCCESS);
            vec![done]
        }
        _ => vec![completed(request)],
    })
    .await;

    let credentials = Credentials::certificate("operator", Arc::new(ReversingSigner));
    let session = Session::connect(SessionConfig::new(server.address(), credentials))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    session.disconnect().await;
}

#[tokio::test]
async fn test_connect_to_nothing_is_connection_error() {
    let err = Session::connect(password_config("127.0.0.1:1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Connection(_)));
    assert!(!err.is_authentication());
}
