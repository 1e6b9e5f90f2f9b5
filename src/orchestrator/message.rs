//! Orchestrator message types.
//!
//! Requests, acknowledgements and status events keep the JSON shape of
//! the capture protocol so they can cross a process boundary unchanged.
//!
//! | Message | Payload | Response |
//! |---------|---------|----------|
//! | `startSession` | `{ totalSections }` | `{ success }` |
//! | `captureFrame` | `{ index, scrollOffset }` | `{ success }` or `{ success: false, error }` |
//! | `finishSession` | `{}` | `{ success }` |
//! | `reportError` | `{ error }` | `{ success }` |
//! | `captureComplete` | `{ filename, path }` | (event) |
//! | `captureError` | `{ error }` | (event) |

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{Error, Result};

use super::session::SessionSnapshot;

// ============================================================================
// Constants
// ============================================================================

/// Status text shown while a capture is running.
pub const STATUS_IN_PROGRESS: &str = "Scrolling and capturing...";

// ============================================================================
// OrchestratorRequest
// ============================================================================

/// A request from the scroll driver to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum OrchestratorRequest {
    /// Start (or restart) a session.
    StartSession {
        /// Planned frame count.
        #[serde(rename = "totalSections")]
        total_sections: u32,
    },

    /// Capture the viewport as section `index`.
    CaptureFrame {
        /// Section index.
        index: u32,
        /// Scroll offset the page reports.
        #[serde(rename = "scrollOffset")]
        scroll_offset: u32,
    },

    /// All sections requested; stitch and save.
    FinishSession,

    /// The page side failed; tear down.
    ReportError {
        /// Human-readable failure.
        error: String,
    },
}

impl OrchestratorRequest {
    /// Protocol action name.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::StartSession { .. } => "startSession",
            Self::CaptureFrame { .. } => "captureFrame",
            Self::FinishSession => "finishSession",
            Self::ReportError { .. } => "reportError",
        }
    }
}

// ============================================================================
// Ack
// ============================================================================

/// Response to an [`OrchestratorRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the request succeeded.
    pub success: bool,

    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    /// A success ack.
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failure ack carrying `message`.
    #[inline]
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    /// Converts the ack back into a result for `action`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Orchestrator`] for a failure ack.
    pub fn into_result(self, action: &str) -> Result<()> {
        if self.success {
            return Ok(());
        }
        let message = self.error.unwrap_or_else(|| "unknown error".to_string());
        Err(Error::orchestrator(action, message))
    }
}

// ============================================================================
// CaptureEvent
// ============================================================================

/// Terminal status event for the UI shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CaptureEvent {
    /// The stitched image was saved.
    CaptureComplete {
        /// Generated filename.
        filename: String,
        /// Where it was written.
        path: PathBuf,
    },

    /// The session failed.
    CaptureError {
        /// Human-readable failure.
        error: String,
    },
}

impl CaptureEvent {
    /// Returns `true` for [`CaptureEvent::CaptureComplete`].
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CaptureComplete { .. })
    }

    /// Status line for the UI shell.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::CaptureComplete { .. } => "Screenshot saved!".to_string(),
            Self::CaptureError { error } => format!("Error: {error}"),
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Internal mailbox item of the orchestrator task.
pub(crate) enum Envelope {
    /// A protocol request and its reply slot.
    Request {
        request: OrchestratorRequest,
        reply: oneshot::Sender<Ack>,
    },
    /// Inspect the session slot.
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Stop the task.
    Shutdown,
}

// ============================================================================
// Tests
// ============================================================================
