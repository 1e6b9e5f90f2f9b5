//! Capture orchestrator: session owner and frame capturer.
//!
//! Runs as its own task, isolated from the page. The scroll driver
//! drives it through four requests:
//!
//! | Request | Effect |
//! |---------|--------|
//! | `startSession` | (Re)initialize the session, dropping old frames |
//! | `captureFrame` | Capture the visible viewport unless the index is known |
//! | `finishSession` | Stitch and download, or fail if nothing was captured |
//! | `reportError` | Tear down and emit a terminal error |
//!
//! Terminal outcomes reach the UI shell as [`CaptureEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! let (orchestrator, mut events) = Orchestrator::spawn(capture, downloads, compositor);
//!
//! orchestrator.start_session(2).await?;
//! orchestrator.capture_frame(0, 0).await?;
//! orchestrator.capture_frame(1, 900).await?;
//! orchestrator.finish_session().await?;
//!
//! println!("{}", events.recv().await.unwrap().status_text());
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod actor;
mod message;
mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use actor::{Orchestrator, OrchestratorHandle};
pub use message::{Ack, CaptureEvent, OrchestratorRequest, STATUS_IN_PROGRESS};
pub use session::{
    CaptureSession, CapturedFrame, FrameSet, SessionPhase, SessionSnapshot, SessionState,
};
