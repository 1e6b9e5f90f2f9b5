//! Error types for full-page capture.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use fullpage_capture::{Result, Error};
//!
//! async fn example(service: &CaptureService) -> Result<()> {
//!     let report = service.capture().await?;
//!     println!("captured {} sections", report.captured().len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Session-fatal | [`Error::Planning`], [`Error::EmptyResult`], [`Error::Compositing`], [`Error::Download`] |
//! | Per-section | [`Error::ScrollStall`], [`Error::CaptureFailed`], [`Error::InvalidSection`] |
//! | Session state | [`Error::CaptureInProgress`], [`Error::NoActiveSession`], [`Error::Orchestrator`], [`Error::OrchestratorClosed`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::ScriptError`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Image`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use image::ImageError;
use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a [`CaptureConfig`](crate::CaptureConfig) is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Session-Fatal Errors
    // ========================================================================
    /// Scroll root or page dimensions could not be determined.
    #[error("Planning failed: {message}")]
    Planning {
        /// Description of the planning failure.
        message: String,
    },

    /// No frame was captured by the time the session finished.
    #[error("No images captured")]
    EmptyResult,

    /// Stitching or encoding the output image failed.
    #[error("Compositing failed: {message}")]
    Compositing {
        /// Description of the compositing failure.
        message: String,
    },

    /// Persisting the stitched image failed.
    #[error("Download failed: {message}")]
    Download {
        /// Description of the download failure.
        message: String,
    },

    // ========================================================================
    // Per-Section Errors
    // ========================================================================
    /// A section never reached its target scroll offset.
    #[error("Section {index} stalled: target {target}px, reached {reached}px")]
    ScrollStall {
        /// Section index.
        index: u32,
        /// Target offset in pixels.
        target: u32,
        /// Offset actually reached in pixels.
        reached: u32,
    },

    /// Viewport capture or decode failed for one section.
    #[error("Capture of section {index} failed: {message}")]
    CaptureFailed {
        /// Section index.
        index: u32,
        /// Underlying failure.
        message: String,
    },

    /// Section index outside the planned range.
    #[error("Section {index} out of range for {total} sections")]
    InvalidSection {
        /// Offending section index.
        index: u32,
        /// Planned section count.
        total: u32,
    },

    // ========================================================================
    // Session State Errors
    // ========================================================================
    /// A capture is already running on this page.
    #[error("Capture already in progress")]
    CaptureInProgress,

    /// A frame or finish request arrived without a session.
    #[error("No active capture session")]
    NoActiveSession,

    /// The orchestrator rejected a request.
    #[error("Orchestrator rejected {action}: {message}")]
    Orchestrator {
        /// Request action name.
        action: String,
        /// Rejection message.
        message: String,
    },

    /// The orchestrator task is gone.
    #[error("Orchestrator closed")]
    OrchestratorClosed,

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout waiting for the bridge extension.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// JavaScript execution error in the page.
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message from script execution.
        message: String,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Image decode or encode error.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a planning error.
    #[inline]
    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning {
            message: message.into(),
        }
    }

    /// Creates a compositing error.
    #[inline]
    pub fn compositing(message: impl Into<String>) -> Self {
        Self::Compositing {
            message: message.into(),
        }
    }

    /// Creates a download error.
    #[inline]
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Creates a scroll stall error.
    #[inline]
    pub fn scroll_stall(index: u32, target: u32, reached: u32) -> Self {
        Self::ScrollStall {
            index,
            target,
            reached,
        }
    }

    /// Creates a capture failure for one section.
    #[inline]
    pub fn capture_failed(index: u32, message: impl Into<String>) -> Self {
        Self::CaptureFailed {
            index,
            message: message.into(),
        }
    }

    /// Creates an invalid section error.
    #[inline]
    pub fn invalid_section(index: u32, total: u32) -> Self {
        Self::InvalidSection { index, total }
    }

    /// Creates an orchestrator rejection.
    #[inline]
    pub fn orchestrator(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Orchestrator {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` for failures confined to one section.
    ///
    /// These are logged and the session carries on without the frame.
    #[inline]
    #[must_use]
    pub fn is_section_failure(&self) -> bool {
        matches!(
            self,
            Self::ScrollStall { .. } | Self::CaptureFailed { .. } | Self::InvalidSection { .. }
        )
    }

    /// Returns `true` for failures that end the whole session.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Planning { .. }
                | Self::EmptyResult
                | Self::Compositing { .. }
                | Self::Download { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_empty_result_message() {
        assert_eq!(Error::EmptyResult.to_string(), "No images captured");
    }

    #[test]
    fn test_scroll_stall_display() {
        let err = Error::scroll_stall(3, 2700, 2400);
        assert_eq!(
            err.to_string(),
            "Section 3 stalled: target 2700px, reached 2400px"
        );
    }

    #[test]
    fn test_section_failures_are_not_fatal() {
        let stall = Error::scroll_stall(1, 900, 0);
        let capture = Error::capture_failed(2, "tab hidden");

        assert!(stall.is_section_failure());
        assert!(capture.is_section_failure());
        assert!(!stall.is_fatal());
        assert!(!capture.is_fatal());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::EmptyResult.is_fatal());
        assert!(Error::planning("no viewport").is_fatal());
        assert!(Error::compositing("encode").is_fatal());
        assert!(Error::download("disk full").is_fatal());
        assert!(!Error::CaptureInProgress.is_fatal());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionTimeout { timeout_ms: 1000 }.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout(RequestId::generate(), 30_000);
        assert!(timeout_err.is_timeout());
        assert!(!Error::connection("test").is_timeout());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
