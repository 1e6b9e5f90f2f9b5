//! Browser entities module.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Tab`] | Browser tab behind the bridge extension |
//!
//! A [`Tab`] is both the page the scroll driver moves and the surface
//! the orchestrator captures, so it implements
//! [`PageContext`](crate::PageContext) and
//! [`ViewportCapture`](crate::ViewportCapture).
//!
//! # Example
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use fullpage_capture::{Result, Tab, transport::PendingServer};
//!
//! # async fn example() -> Result<()> {
//! let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
//! let tab = Tab::connect(server).await?;
//!
//! let title = tab.execute_script("return document.title").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Browser tab automation.
pub mod tab;

// ============================================================================
// Re-exports
// ============================================================================

pub use tab::Tab;
