//! Full-page browser screenshots.
//!
//! Captures an entire scrollable page by scrolling it section by section,
//! taking a viewport screenshot at each stop and stitching the frames into
//! one tall PNG.
//!
//! # Architecture
//!
//! Two independent tasks cooperate through request/response messages:
//!
//! - **Scroll driver** (page side): plans the sections, scrolls, waits for
//!   the page to settle and asks for each capture.
//! - **Capture orchestrator** (privileged side): owns the session,
//!   captures the visible viewport, then stitches and saves the frames.
//!
//! ```text
//! ┌──────────────┐  startSession / captureFrame   ┌────────────────┐
//! │ ScrollDriver │ ─────────────────────────────► │  Orchestrator  │
//! │              │  finishSession / reportError   │                │
//! │  PageContext │ ◄───────────────────────────── │ ViewportCapture│
//! └──────────────┘          { success }           │ DownloadSink   │
//!                                                 └───────┬────────┘
//!                                                         │ CaptureEvent
//!                                                         ▼
//!                                                      UI shell
//! ```
//!
//! The page and the screen are reached through capability traits. The
//! production implementation of both is a browser [`Tab`] driven over a
//! WebSocket bridge extension.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use fullpage_capture::{CaptureConfig, CaptureService, Result, Tab};
//! use fullpage_capture::transport::PendingServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
//!     println!("Waiting for the bridge on {}", server.ws_url());
//!
//!     let tab = Tab::connect(server).await?;
//!     tab.focus().await?;
//!
//!     let config = CaptureConfig::new().with_download_dir("./shots");
//!     let (service, mut events) = CaptureService::for_tab(tab, config)?;
//!
//!     service.capture().await?;
//!     if let Some(event) = events.recv().await {
//!         println!("{}", event.status_text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | Page, capture and download traits |
//! | [`plan`] | Section geometry |
//! | [`scroll`] | Scroll driver state machine |
//! | [`orchestrator`] | Session owner and frame capturer |
//! | [`compositor`] | Frame stitching and PNG output |
//! | [`service`] | Wiring and the UI-facing entry point |
//! | [`config`] | Tunable delays and output settings |
//! | [`browser`] | [`Tab`] over the bridge extension |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebSocket message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Browser tab over the bridge extension.
pub mod browser;

/// Capabilities the capture core calls through.
pub mod capability;

/// Frame stitching and PNG output.
pub mod compositor;

/// Capture configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Session owner and frame capturer.
pub mod orchestrator;

/// Section geometry.
pub mod plan;

/// WebSocket protocol message types.
///
/// Internal module defining command/response structures.
pub mod protocol;

/// Scroll driver.
pub mod scroll;

/// UI-facing capture service.
pub mod service;

/// WebSocket transport layer.
///
/// Internal module handling the WebSocket server and connection.
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::Tab;

// Capabilities
pub use capability::{
    DirectoryDownloads, DownloadSink, PageContext, PageMetrics, ScrollRoot, ViewportCapture,
};

// Core types
pub use compositor::{Compositor, EncodedScreenshot, SavedScreenshot, StitchedImage};
pub use config::{CaptureConfig, SettleConfig};
pub use orchestrator::{
    Ack, CaptureEvent, Orchestrator, OrchestratorHandle, OrchestratorRequest, SessionPhase,
    SessionSnapshot,
};
pub use plan::ScrollPlan;
pub use scroll::{CaptureReport, DriverState, ScrollDriver, SectionOutcome};
pub use service::CaptureService;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, SessionId, TabId};
