//! Orchestrator task and its client handle.
//!
//! The orchestrator owns the session slot exclusively and handles one
//! mailbox item at a time, so no lock guards the frames. Callers reach it
//! only through [`OrchestratorHandle`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::capability::{DownloadSink, ViewportCapture};
use crate::compositor::{Compositor, SavedScreenshot};
use crate::error::{Error, Result};

use super::message::{Ack, CaptureEvent, Envelope, OrchestratorRequest};
use super::session::{CaptureSession, CapturedFrame, SessionSnapshot, SessionState};

// ============================================================================
// Orchestrator
// ============================================================================

/// Session owner and frame capturer.
pub struct Orchestrator {
    state: SessionState,
    capture: Arc<dyn ViewportCapture>,
    downloads: Arc<dyn DownloadSink>,
    compositor: Compositor,
    events: mpsc::UnboundedSender<CaptureEvent>,
}

/// Work left after a request is acknowledged.
enum Followup {
    None,
    Finish,
}

impl Orchestrator {
    /// Spawns the orchestrator task.
    ///
    /// Returns the handle for sending requests and the receiver of
    /// terminal status events.
    pub fn spawn(
        capture: Arc<dyn ViewportCapture>,
        downloads: Arc<dyn DownloadSink>,
        compositor: Compositor,
    ) -> (OrchestratorHandle, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            state: SessionState::Empty,
            capture,
            downloads,
            compositor,
            events: events_tx,
        };
        tokio::spawn(orchestrator.run(rx));

        (OrchestratorHandle { tx }, events_rx)
    }

    /// Mailbox loop.
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            match envelope {
                Envelope::Request { request, reply } => {
                    let action = request.action();
                    match self.handle(request).await {
                        Ok(Followup::None) => {
                            let _ = reply.send(Ack::ok());
                        }
                        Ok(Followup::Finish) => {
                            // The page side does not wait for stitching.
                            let _ = reply.send(Ack::ok());
                            self.finish_session().await;
                        }
                        Err(e) => {
                            debug!(action, error = %e, "Request rejected");
                            let _ = reply.send(Ack::failure(e.to_string()));
                        }
                    }
                }

                Envelope::Snapshot { reply } => {
                    let _ = reply.send(self.state.snapshot());
                }

                Envelope::Shutdown => {
                    debug!("Orchestrator shutdown requested");
                    break;
                }
            }
        }

        debug!("Orchestrator terminated");
    }

    /// Dispatches one request.
    ///
    /// `finishSession` is only acknowledged here; the mailbox loop runs the
    /// finish after the reply is sent.
    async fn handle(&mut self, request: OrchestratorRequest) -> Result<Followup> {
        match request {
            OrchestratorRequest::StartSession { total_sections } => {
                self.start_session(total_sections)?;
            }
            OrchestratorRequest::CaptureFrame {
                index,
                scroll_offset,
            } => self.capture_frame(index, scroll_offset).await?,
            OrchestratorRequest::ReportError { error } => self.fail_session(error),
            OrchestratorRequest::FinishSession => return Ok(Followup::Finish),
        }
        Ok(Followup::None)
    }

    /// Installs a new session, discarding any previous one.
    fn start_session(&mut self, total_sections: u32) -> Result<()> {
        if total_sections == 0 {
            return Err(Error::planning("session needs at least one section"));
        }

        if let Some(previous) = self.state.begin(total_sections) {
            warn!(
                session = %previous.id,
                discarded = previous.frames.len(),
                "Session restarted, previous frames discarded"
            );
        }

        if let Some(session) = self.state.active() {
            info!(session = %session.id, total_sections, "Capture session started");
        }
        Ok(())
    }

    /// Captures the visible viewport as section `index`.
    async fn capture_frame(&mut self, index: u32, scroll_offset: u32) -> Result<()> {
        let session = self.state.active().ok_or(Error::NoActiveSession)?;
        session.check_index(index)?;

        if session.frames.contains(index) {
            warn!(index, "Section already captured, skipping duplicate");
            return Ok(());
        }

        let bytes = self
            .capture
            .capture_visible()
            .await
            .map_err(|e| Error::capture_failed(index, e.to_string()))?;
        let frame = CapturedFrame::decode(index, scroll_offset, &bytes)?;

        // The slot may not be borrowed across the capture await.
        let session = self.state.active_mut().ok_or(Error::NoActiveSession)?;
        if let Some(width) = session.frames.width()
            && width != frame.width()
        {
            return Err(Error::capture_failed(
                index,
                format!("frame is {}px wide, session is {width}px", frame.width()),
            ));
        }

        let (width, height) = frame.image.dimensions();
        session.frames.insert(frame);

        debug!(
            index,
            scroll_offset,
            width,
            height,
            captured = session.frames.len(),
            total = session.total_sections,
            "Section captured"
        );
        Ok(())
    }

    /// Stitches and saves the active session, then clears it.
    async fn finish_session(&mut self) {
        let session = match self.state.finish() {
            Some(session) if !session.frames.is_empty() => session,
            _ => {
                self.fail_session(Error::EmptyResult.to_string());
                return;
            }
        };

        info!(
            session = %session.id,
            frames = session.frames.len(),
            total = session.total_sections,
            "Stitching frames"
        );

        match self.compose_and_save(session).await {
            Ok(saved) => {
                self.state.clear();
                let _ = self.events.send(CaptureEvent::CaptureComplete {
                    filename: saved.filename,
                    path: saved.path,
                });
            }
            Err(e) => self.fail_session(e.to_string()),
        }
    }

    /// Composes and encodes off the async runtime, then downloads.
    async fn compose_and_save(&self, session: CaptureSession) -> Result<SavedScreenshot> {
        let compositor = self.compositor.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            compositor
                .compose(session.frames.iter(), Utc::now())?
                .encode()
        })
        .await
        .map_err(|e| Error::compositing(format!("compositor task failed: {e}")))??;

        self.compositor
            .deliver(encoded, self.downloads.as_ref())
            .await
    }

    /// Clears all session state and emits a terminal error.
    fn fail_session(&mut self, message: String) {
        error!(error = %message, "Capture session failed");
        self.state.clear();
        let _ = self.events.send(CaptureEvent::CaptureError { error: message });
    }
}

// ============================================================================
// OrchestratorHandle
// ============================================================================

/// Cloneable client of the orchestrator task.
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl OrchestratorHandle {
    /// Sends a request and returns the raw ack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the task is gone.
    pub async fn request(&self, request: OrchestratorRequest) -> Result<Ack> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope::Request { request, reply })
            .map_err(|_| Error::OrchestratorClosed)?;
        rx.await.map_err(|_| Error::OrchestratorClosed)
    }

    /// Sends a request and converts a failure ack into an error.
    async fn call(&self, request: OrchestratorRequest) -> Result<()> {
        let action = request.action();
        self.request(request).await?.into_result(action)
    }

    /// Starts a session expecting `total_sections` frames.
    pub async fn start_session(&self, total_sections: u32) -> Result<()> {
        self.call(OrchestratorRequest::StartSession { total_sections })
            .await
    }

    /// Captures the current viewport as section `index`.
    pub async fn capture_frame(&self, index: u32, scroll_offset: u32) -> Result<()> {
        self.call(OrchestratorRequest::CaptureFrame {
            index,
            scroll_offset,
        })
        .await
    }

    /// Ends the session. Stitching continues after this returns.
    pub async fn finish_session(&self) -> Result<()> {
        self.call(OrchestratorRequest::FinishSession).await
    }

    /// Reports a page-side failure, tearing the session down.
    pub async fn report_error(&self, error: impl Into<String>) -> Result<()> {
        self.call(OrchestratorRequest::ReportError {
            error: error.into(),
        })
        .await
    }

    /// Returns a snapshot of the session slot.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope::Snapshot { reply })
            .map_err(|_| Error::OrchestratorClosed)?;
        rx.await.map_err(|_| Error::OrchestratorClosed)
    }

    /// Stops the orchestrator task.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Envelope::Shutdown);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    use crate::orchestrator::SessionPhase;
    use crate::testing::{MemoryDownloads, ScriptedCapture};

    fn spawn_with(
        capture: ScriptedCapture,
    ) -> (
        OrchestratorHandle,
        mpsc::UnboundedReceiver<CaptureEvent>,
        Arc<ScriptedCapture>,
        Arc<MemoryDownloads>,
    ) {
        let capture = Arc::new(capture);
        let downloads = Arc::new(MemoryDownloads::default());
        let (handle, events) = Orchestrator::spawn(
            capture.clone(),
            downloads.clone(),
            Compositor::new(10, "fullpage_screenshot"),
        );
        (handle, events, capture, downloads)
    }

    #[tokio::test]
    async fn test_duplicate_index_is_noop() {
        let (handle, _events, capture, _) = spawn_with(ScriptedCapture::solid(8, 100));

        assert_ok!(handle.start_session(4).await);
        assert_ok!(handle.capture_frame(2, 1800).await);
        assert_ok!(handle.capture_frame(2, 1800).await);

        let snapshot = handle.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.captured, vec![2]);
        // The duplicate never reached the capture primitive.
        assert_eq!(capture.calls(), 1);
    }

    #[tokio::test]
    async fn test_capture_without_session_rejected() {
        let (handle, _events, capture, _) = spawn_with(ScriptedCapture::solid(8, 100));

        let err = handle.capture_frame(0, 0).await.unwrap_err();
        assert!(err.to_string().contains("No active capture session"));
        assert_eq!(capture.calls(), 0);
    }

    #[tokio::test]
    async fn test_index_beyond_plan_rejected() {
        let (handle, _events, _, _) = spawn_with(ScriptedCapture::solid(8, 100));

        assert_ok!(handle.start_session(2).await);
        assert_err!(handle.capture_frame(2, 0).await);
        assert!(handle.snapshot().await.expect("snapshot").captured.is_empty());
    }

    #[tokio::test]
    async fn test_capture_failure_propagates() {
        let (handle, _events, _, _) =
            spawn_with(ScriptedCapture::solid(8, 100).failing_on_calls([1]));

        assert_ok!(handle.start_session(3).await);
        assert_ok!(handle.capture_frame(0, 0).await);
        let err = handle.capture_frame(1, 90).await.unwrap_err();
        assert!(err.to_string().contains("Capture of section 1 failed"));

        // The failed index can be captured later.
        assert_ok!(handle.capture_frame(1, 90).await);
        assert_eq!(
            handle.snapshot().await.expect("snapshot").captured,
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn test_width_mismatch_rejected() {
        let (handle, _events, _, _) =
            spawn_with(ScriptedCapture::sized([(8, 100), (6, 100)]));

        assert_ok!(handle.start_session(2).await);
        assert_ok!(handle.capture_frame(0, 0).await);
        assert_err!(handle.capture_frame(1, 90).await);
        assert_eq!(handle.snapshot().await.expect("snapshot").captured, vec![0]);
    }

    #[tokio::test]
    async fn test_restart_discards_frames() {
        let (handle, _events, _, _) = spawn_with(ScriptedCapture::solid(8, 100));

        assert_ok!(handle.start_session(3).await);
        assert_ok!(handle.capture_frame(0, 0).await);
        assert_ok!(handle.capture_frame(1, 90).await);
        assert_ok!(handle.start_session(3).await);
        assert_ok!(handle.capture_frame(2, 180).await);

        let snapshot = handle.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.captured, vec![2]);
    }

    #[tokio::test]
    async fn test_finish_empty_session_errors_without_compositing() {
        let (handle, mut events, _, downloads) = spawn_with(ScriptedCapture::solid(8, 100));

        assert_ok!(handle.start_session(2).await);
        assert_ok!(handle.finish_session().await);

        let event = events.recv().await.expect("event");
        assert_eq!(
            event,
            CaptureEvent::CaptureError {
                error: "No images captured".into()
            }
        );
        assert!(downloads.files().is_empty());
        assert_eq!(
            handle.snapshot().await.expect("snapshot").phase,
            SessionPhase::Empty
        );
    }

    #[tokio::test]
    async fn test_finish_stitches_and_saves() {
        let (handle, mut events, _, downloads) = spawn_with(ScriptedCapture::solid(8, 800));

        assert_ok!(handle.start_session(3).await);
        for (index, offset) in [(2, 1440), (0, 0), (1, 720)] {
            assert_ok!(handle.capture_frame(index, offset).await);
        }
        assert_ok!(handle.finish_session().await);

        let event = events.recv().await.expect("event");
        let CaptureEvent::CaptureComplete { filename, .. } = event else {
            panic!("expected completion, got {event:?}");
        };
        assert!(filename.starts_with("fullpage_screenshot_"));
        assert!(filename.ends_with(".png"));

        let files = downloads.files();
        assert_eq!(files.len(), 1);
        let image = image::load_from_memory(&files[0].1).expect("png");
        assert_eq!((image.width(), image.height()), (8, 2380));

        assert_eq!(
            handle.snapshot().await.expect("snapshot").phase,
            SessionPhase::Empty
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_finish_completes_before_next_request() {
        let (handle, _events, _, downloads) = spawn_with(ScriptedCapture::solid(8, 400));

        assert_ok!(handle.start_session(2).await);
        assert_ok!(handle.capture_frame(0, 0).await);
        assert_ok!(handle.capture_frame(1, 360).await);
        assert_ok!(handle.finish_session().await);

        // Queued behind the finish, so the file is already written.
        let snapshot = handle.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.phase, SessionPhase::Empty);
        assert_eq!(downloads.files().len(), 1);
    }

    #[tokio::test]
    async fn test_finish_without_session_reports_error() {
        let (handle, mut events, _, downloads) = spawn_with(ScriptedCapture::solid(8, 100));

        assert_ok!(handle.finish_session().await);

        assert!(!events.recv().await.expect("event").is_success());
        assert!(downloads.files().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_reported() {
        let capture = Arc::new(ScriptedCapture::solid(4, 50));
        let downloads = Arc::new(MemoryDownloads::failing());
        let (handle, mut events) =
            Orchestrator::spawn(capture, downloads, Compositor::new(10, "shot"));

        assert_ok!(handle.start_session(1).await);
        assert_ok!(handle.capture_frame(0, 0).await);
        assert_ok!(handle.finish_session().await);

        let event = events.recv().await.expect("event");
        assert!(!event.is_success());
        assert!(event.status_text().starts_with("Error: Download failed"));
    }

    #[tokio::test]
    async fn test_report_error_tears_down() {
        let (handle, mut events, _, _) = spawn_with(ScriptedCapture::solid(8, 100));

        assert_ok!(handle.start_session(3).await);
        assert_ok!(handle.capture_frame(0, 0).await);
        assert_ok!(handle.report_error("page navigated away").await);

        assert_eq!(
            events.recv().await.expect("event"),
            CaptureEvent::CaptureError {
                error: "page navigated away".into()
            }
        );
        let snapshot = handle.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.phase, SessionPhase::Empty);
        assert!(snapshot.captured.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let (handle, _events, _, _) = spawn_with(ScriptedCapture::solid(8, 100));

        handle.shutdown();
        let err = handle.start_session(1).await.unwrap_err();
        assert!(matches!(err, Error::OrchestratorClosed));
    }
}
