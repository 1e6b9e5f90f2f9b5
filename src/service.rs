//! Capture service: the entry point a UI shell talks to.
//!
//! [`CaptureService`] wires a page, a capture primitive and a download
//! sink to a [`ScrollDriver`] and an [`Orchestrator`], and hands back the
//! receiver of terminal [`CaptureEvent`]s.
//!
//! # Example
//!
//! ```no_run
//! use fullpage_capture::{CaptureConfig, CaptureService, Result, Tab};
//!
//! # async fn example(tab: Tab) -> Result<()> {
//! let (service, mut events) = CaptureService::for_tab(tab, CaptureConfig::new())?;
//!
//! service.start_capture()?;
//! if let Some(event) = events.recv().await {
//!     println!("{}", event.status_text());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::browser::Tab;
use crate::capability::{DirectoryDownloads, DownloadSink, PageContext, ViewportCapture};
use crate::compositor::Compositor;
use crate::config::CaptureConfig;
use crate::error::Result;
use crate::orchestrator::{CaptureEvent, Orchestrator, OrchestratorHandle, SessionSnapshot};
use crate::scroll::{CaptureReport, DriverState, ScrollDriver};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the service.
struct ServiceInner {
    /// Page-side driver.
    driver: ScrollDriver,
    /// Handle to the orchestrator task.
    orchestrator: OrchestratorHandle,
    /// Validated configuration.
    config: Arc<CaptureConfig>,
}

// ============================================================================
// CaptureService
// ============================================================================

/// Full-page capture for one page.
///
/// Cheap to clone; clones share the driver and the orchestrator.
#[derive(Clone)]
pub struct CaptureService {
    inner: Arc<ServiceInner>,
}

impl fmt::Debug for CaptureService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureService")
            .field("state", &self.state())
            .field("download_dir", &self.inner.config.download_dir)
            .finish_non_exhaustive()
    }
}

impl CaptureService {
    /// Creates a service over arbitrary collaborators.
    ///
    /// Spawns the orchestrator task, so this must run inside a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` is invalid.
    pub fn new(
        page: Arc<dyn PageContext>,
        capture: Arc<dyn ViewportCapture>,
        downloads: Arc<dyn DownloadSink>,
        config: CaptureConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CaptureEvent>)> {
        config.validate()?;
        let config = Arc::new(config);

        let (orchestrator, events) =
            Orchestrator::spawn(capture, downloads, Compositor::from_config(&config));
        let driver = ScrollDriver::new(page, orchestrator.clone(), Arc::clone(&config));

        debug!(download_dir = %config.download_dir.display(), "Capture service created");

        let service = Self {
            inner: Arc::new(ServiceInner {
                driver,
                orchestrator,
                config,
            }),
        };
        Ok((service, events))
    }

    /// Creates a service capturing `tab` into the configured directory.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn for_tab(
        tab: Tab,
        config: CaptureConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CaptureEvent>)> {
        let tab = Arc::new(tab);
        let downloads = Arc::new(DirectoryDownloads::new(config.download_dir.clone()));
        Self::new(tab.clone(), tab, downloads, config)
    }
}

// ============================================================================
// CaptureService - Public API
// ============================================================================

impl CaptureService {
    /// Starts a capture in the background.
    ///
    /// Returns as soon as the run is claimed; the outcome arrives later as
    /// a [`CaptureEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureInProgress`](crate::Error::CaptureInProgress)
    /// while a capture is running.
    pub fn start_capture(&self) -> Result<()> {
        let guard = self.inner.driver.try_begin()?;
        let driver = self.inner.driver.clone();

        info!("Capture started");
        tokio::spawn(async move {
            // Failures were already reported to the orchestrator.
            let _ = driver.run_claimed(guard).await;
        });
        Ok(())
    }

    /// Runs a capture and waits for the page walk to finish.
    ///
    /// Stitching and saving continue after this returns; their outcome
    /// arrives as a [`CaptureEvent`].
    ///
    /// # Errors
    ///
    /// - [`Error::CaptureInProgress`](crate::Error::CaptureInProgress) while
    ///   a capture is running
    /// - whatever aborted the run
    pub async fn capture(&self) -> Result<CaptureReport> {
        self.inner.driver.run().await
    }

    /// Returns the scroll driver state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.inner.driver.state()
    }

    /// Returns the orchestrator's session snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`](crate::Error::OrchestratorClosed)
    /// after [`shutdown`](Self::shutdown).
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.inner.orchestrator.snapshot().await
    }

    /// Returns the configuration in use.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CaptureConfig {
        &self.inner.config
    }

    /// Stops the orchestrator task.
    pub fn shutdown(&self) {
        self.inner.orchestrator.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================
