//! WebSocket server the bridge extension connects to.
//!
//! # Connection Flow
//!
//! 1. Bind the WebSocket server to `localhost:0` (random port)
//! 2. Hand the URL to the bridge extension
//! 3. Extension connects to the WebSocket server
//! 4. Extension sends READY naming the tab it is attached to
//! 5. Connection established, ready for commands

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::Connection;
use super::connection::ReadyData;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for waiting for the extension to connect.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// PendingServer
// ============================================================================

/// A WebSocket server that is bound but not yet connected.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use fullpage_capture::transport::PendingServer;
///
/// let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// println!("point the bridge at {}", server.ws_url());
///
/// let (connection, ready) = server.accept().await?;
/// ```
pub struct PendingServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
}

impl PendingServer {
    /// Binds a WebSocket server to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "WebSocket server bound");

        Ok(Self {
            listener,
            port: actual_port,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)
    }

    /// Accepts the bridge connection and completes the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if nothing connects within 30s
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    /// - [`Error::Protocol`] if the READY handshake is malformed
    pub async fn accept(self) -> Result<(Connection, ReadyData)> {
        let (stream, addr) = timeout(CONNECTION_TIMEOUT, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(CONNECTION_TIMEOUT.as_millis() as u64))??;

        debug!(?addr, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        info!(port = self.port, "WebSocket connection established");

        let connection = Connection::new(ws_stream);
        let ready_data = connection.wait_ready().await?;

        Ok((connection, ready_data))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    use crate::identifiers::TabId;
    use crate::protocol::{Command, Request, ScriptCommand};

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");

        assert!(server.port() > 0);
        assert_eq!(server.ws_url(), format!("ws://127.0.0.1:{}", server.port()));
        assert_eq!(server.local_addr().port(), server.port());
    }

    #[tokio::test]
    async fn test_accept_handshake_and_round_trip() {
        let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind should succeed");
        let url = server.ws_url();

        // Minimal bridge: announce tab 5, then answer every request with 42.
        let bridge = tokio::spawn(async move {
            let (mut ws, _) = tokio_tungstenite::connect_async(url)
                .await
                .expect("connect");
            ws.send(Message::Text(
                r#"{"id":"00000000-0000-0000-0000-000000000000","type":"success","result":{"tabId":5}}"#
                    .into(),
            ))
            .await
            .expect("send ready");

            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: serde_json::Value = serde_json::from_str(&text).expect("json");
                let reply = serde_json::json!({
                    "id": request["id"],
                    "type": "success",
                    "result": 42
                });
                ws.send(Message::Text(reply.to_string().into()))
                    .await
                    .expect("send reply");
            }
        });

        let (connection, ready) = server.accept().await.expect("accept");
        assert_eq!(ready.tab_id, 5);

        let tab_id = TabId::new(ready.tab_id).expect("tab id");
        let request = Request::new(
            tab_id,
            Command::Script(ScriptCommand::Evaluate {
                script: "return 42".to_string(),
                args: vec![],
            }),
        );
        let response = connection.send(request).await.expect("response");
        assert_eq!(response.into_result().expect("success"), serde_json::json!(42));
        assert_eq!(connection.pending_count(), 0);

        connection.shutdown();
        bridge.await.expect("bridge task");
    }
}
