//! Core Tab struct and accessors.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::protocol::{Command, Request, Response};
use crate::transport::{Connection, PendingServer};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a tab.
pub(crate) struct TabInner {
    /// Tab ID.
    pub tab_id: TabId,
    /// Bridge connection.
    pub connection: Connection,
}

// ============================================================================
// Tab
// ============================================================================

/// A handle to a browser tab.
///
/// Tabs provide scripting, scrolling and visible-area capture.
#[derive(Clone)]
pub struct Tab {
    pub(crate) inner: Arc<TabInner>,
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("tab_id", &self.inner.tab_id)
            .field("pending", &self.inner.connection.pending_count())
            .finish_non_exhaustive()
    }
}

impl Tab {
    /// Creates a new tab handle over an established connection.
    #[must_use]
    pub fn new(tab_id: TabId, connection: Connection) -> Self {
        Self {
            inner: Arc::new(TabInner { tab_id, connection }),
        }
    }

    /// Waits for the bridge to connect and returns the tab it announced.
    ///
    /// # Errors
    ///
    /// Propagates handshake failures from [`PendingServer::accept`], and
    /// returns [`Error::Protocol`] if the announced tab ID is zero.
    pub async fn connect(server: PendingServer) -> Result<Self> {
        let (connection, ready) = server.accept().await?;
        let tab_id = TabId::new(ready.tab_id)
            .ok_or_else(|| Error::protocol("Bridge announced tab ID 0"))?;

        info!(%tab_id, "Tab attached");
        Ok(Self::new(tab_id, connection))
    }
}

// ============================================================================
// Tab - Accessors
// ============================================================================

impl Tab {
    /// Returns the tab ID.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// Returns the bridge connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }
}

// ============================================================================
// Tab - Internal
// ============================================================================

impl Tab {
    /// Sends a command and returns the response.
    pub(crate) async fn send_command(&self, command: Command) -> Result<Response> {
        let request = Request::new(self.inner.tab_id, command);
        self.inner.connection.send(request).await
    }
}

// ============================================================================
// Tests
// ============================================================================
