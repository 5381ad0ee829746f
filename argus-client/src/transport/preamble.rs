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

//! Connection preamble.
//!
//! Before any application message is exchanged, client and server trade a
//! fixed 8-byte preamble: magic, transport framing version, and option
//! bits. This is where transport encryption is negotiated; the server's
//! answer determines whether the stream is wrapped in TLS. A server that
//! refuses requested encryption surfaces as
//! [`TransportError::EncryptionUnavailable`], never a silent fallback.
//!
//! ```text
//! +----------+------------+------------+
//! | Magic(4) | Version(2) | Options(2) |
//! +----------+------------+------------+
//! ```

use super::error::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Preamble magic bytes.
pub const PREAMBLE_MAGIC: [u8; 4] = *b"ARGS";

/// Transport framing version spoken by this client.
pub const PREAMBLE_VERSION: u16 = 1;

/// Total preamble size in bytes.
pub const PREAMBLE_SIZE: usize = 8;

/// Option bit: TLS requested (client) / accepted (server).
pub const OPT_TLS: u16 = 0x0001;

/// Runs the client side of the preamble exchange.
///
/// Returns `true` if the connection proceeds with TLS.
///
/// # Errors
///
/// Returns [`TransportError::NegotiationFailed`] if the peer does not
/// answer with a valid preamble, and
/// [`TransportError::EncryptionUnavailable`] if encryption was requested
/// but the server refused it.
pub(crate) async fn negotiate<S>(stream: &mut S, want_tls: bool) -> Result<bool, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut hello = [0u8; PREAMBLE_SIZE];
    hello[..4].copy_from_slice(&PREAMBLE_MAGIC);
    hello[4..6].copy_from_slice(&PREAMBLE_VERSION.to_be_bytes());
    let options = if want_tls { OPT_TLS } else { 0 };
    hello[6..8].copy_from_slice(&options.to_be_bytes());
    stream.write_all(&hello).await?;
    stream.flush().await?;

    let mut reply = [0u8; PREAMBLE_SIZE];
    stream.read_exact(&mut reply).await?;

    if reply[..4] != PREAMBLE_MAGIC {
        return Err(TransportError::NegotiationFailed {
            reason: "peer is not an Argus server".to_string(),
        });
    }
    let version = u16::from_be_bytes([reply[4], reply[5]]);
    if version != PREAMBLE_VERSION {
        return Err(TransportError::NegotiationFailed {
            reason: format!(
                "unsupported transport framing version {version} (client speaks {PREAMBLE_VERSION})"
            ),
        });
    }

    let accepted = u16::from_be_bytes([reply[6], reply[7]]);
    let tls_accepted = accepted & OPT_TLS != 0;
    if want_tls && !tls_accepted {
        return Err(TransportError::EncryptionUnavailable);
    }
    Ok(want_tls && tls_accepted)
}
