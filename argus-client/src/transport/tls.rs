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

//! TLS support for the transport channel.
//!
//! Encryption is negotiated in the connection preamble; when the server
//! accepts, the TCP stream is wrapped with `tokio-rustls` before any
//! application message is exchanged. Server certificates verify against
//! the platform trust store, optionally extended with a site CA bundle.

use super::error::TransportError;
use rustls::pki_types::{CertificateDer, ServerName};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

/// Transport encryption preference for a session.
///
/// There is no "preferred" mode: when encryption is enabled and the
/// server refuses it, [`TransportError::EncryptionUnavailable`] surfaces
/// to the caller, who may explicitly retry with
/// [`EncryptionMode::Disabled`].
#[derive(Debug, Clone, Default)]
pub enum EncryptionMode {
    /// Plaintext TCP.
    #[default]
    Disabled,
    /// TLS with the given verification options.
    Enabled(TlsOptions),
}

impl EncryptionMode {
    /// Returns `true` if encryption was requested.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

/// Certificate verification options for an encrypted session.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    ca_bundle: Option<PathBuf>,
    accept_invalid_certs: bool,
}

impl TlsOptions {
    /// Creates options that verify against the platform trust store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a PEM bundle of additional trusted CA certificates.
    #[must_use]
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Disables certificate verification entirely.
    ///
    /// **WARNING**: only for test rigs and lab setups. Never use in
    /// production!
    #[must_use]
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }
}

/// Builds a TLS connector from the given options.
pub(crate) fn build_connector(options: &TlsOptions) -> Result<TlsConnector, TransportError> {
    if options.accept_invalid_certs {
        let config = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth();
        return Ok(TlsConnector::from(Arc::new(config)));
    }

    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().map_err(|e| {
        TransportError::InvalidTlsConfiguration {
            reason: format!("cannot load platform trust store: {e}"),
        }
    })? {
        roots
            .add(cert)
            .map_err(|e| TransportError::InvalidTlsConfiguration {
                reason: format!("rejected platform certificate: {e}"),
            })?;
    }

    if let Some(path) = &options.ca_bundle {
        let pem = std::fs::read(path).map_err(|e| TransportError::InvalidTlsConfiguration {
            reason: format!("cannot read CA bundle {}: {e}", path.display()),
        })?;
        for cert in rustls_pemfile::certs(&mut &pem[..]) {
            let cert = cert.map_err(|e| TransportError::InvalidTlsConfiguration {
                reason: format!("cannot parse CA bundle {}: {e}", path.display()),
            })?;
            roots
                .add(cert)
                .map_err(|e| TransportError::InvalidTlsConfiguration {
                    reason: format!("rejected CA certificate: {e}"),
                })?;
        }
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Parses a host name into a rustls server name for SNI.
pub(crate) fn server_name(host: &str) -> Result<ServerName<'static>, TransportError> {
    ServerName::try_from(host.to_string()).map_err(|e| TransportError::InvalidTlsConfiguration {
        reason: format!("invalid server name {host:?}: {e}"),
    })
}

/// A socket stream that is either plaintext TCP or TLS over TCP.
///
/// Chosen once during connection setup based on the preamble outcome;
/// all framing code is generic over `AsyncRead + AsyncWrite` and never
/// sees the difference.
#[derive(Debug)]
pub(crate) enum SocketStream {
    /// Plaintext TCP.
    Plain(TcpStream),
    /// TLS-wrapped TCP.
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for SocketStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SocketStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Certificate verifier that accepts any certificate (insecure).
///
/// Used only behind [`TlsOptions::danger_accept_invalid_certs`].
#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
