//! The scroll driver: plans a run, walks the page and requests captures.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::capability::{PageContext, ScrollRoot};
use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::orchestrator::OrchestratorHandle;
use crate::plan::ScrollPlan;

use super::report::{CaptureReport, SectionOutcome};
use super::settle::{Settle, wait_for_settle};
use super::state::{DriverState, RunGuard, SharedState};

// ============================================================================
// Arrival
// ============================================================================

/// Where a section scroll ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    /// Close enough to capture.
    Reached,
    /// Still stuck after the retry.
    Stalled { reached: u32 },
}

// ============================================================================
// ScrollDriver
// ============================================================================

/// Scrolls a page section by section, asking the orchestrator to capture
/// each one once the page has settled.
///
/// One driver runs at most one capture at a time; see
/// [`SharedState::try_begin`].
#[derive(Clone)]
pub struct ScrollDriver {
    page: Arc<dyn PageContext>,
    orchestrator: OrchestratorHandle,
    config: Arc<CaptureConfig>,
    state: SharedState,
}

impl ScrollDriver {
    /// Creates an idle driver.
    #[must_use]
    pub fn new(
        page: Arc<dyn PageContext>,
        orchestrator: OrchestratorHandle,
        config: Arc<CaptureConfig>,
    ) -> Self {
        Self {
            page,
            orchestrator,
            config,
            state: SharedState::new(),
        }
    }

    /// Returns the current driver state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state.get()
    }

    /// Claims the driver for one run without starting it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureInProgress`] unless the driver is idle.
    pub fn try_begin(&self) -> Result<RunGuard> {
        self.state.try_begin()
    }

    /// Runs one full capture.
    ///
    /// # Errors
    ///
    /// - [`Error::CaptureInProgress`] if a run is already going
    /// - whatever aborted the run, after it was reported to the orchestrator
    pub async fn run(&self) -> Result<CaptureReport> {
        let guard = self.try_begin()?;
        self.run_claimed(guard).await
    }

    /// Runs one full capture on an already claimed driver.
    ///
    /// The claim is released when this returns.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_claimed(&self, guard: RunGuard) -> Result<CaptureReport> {
        match self.drive(&guard).await {
            Ok(report) => {
                info!(
                    total = report.total_sections,
                    captured = report.captured().len(),
                    skipped = report.skipped().len(),
                    failed = report.failed().len(),
                    "Capture run finished"
                );
                Ok(report)
            }
            Err(e) => {
                guard.enter(DriverState::Aborted);
                error!(error = %e, "Capture run aborted");

                if let Err(report_err) = self.orchestrator.report_error(e.to_string()).await {
                    warn!(error = %report_err, "Failed to report abort to orchestrator");
                }
                Err(e)
            }
        }
    }

    /// The run itself; any error aborts it.
    async fn drive(&self, guard: &RunGuard) -> Result<CaptureReport> {
        let config = self.config.as_ref();

        // Planning
        let root = self
            .page
            .find_scroll_root()
            .await
            .map_err(|e| Error::planning(format!("scroll root discovery failed: {e}")))?;

        sleep(config.initial_delay()).await;

        let metrics = self
            .page
            .measure(&root)
            .await
            .map_err(|e| Error::planning(format!("page measurement failed: {e}")))?;
        let plan = ScrollPlan::compute(
            metrics.content_height,
            metrics.viewport_height,
            config.scroll_step_ratio,
        )?;

        info!(
            page_height = plan.page_height,
            viewport_height = plan.viewport_height,
            viewport_width = metrics.viewport_width,
            scroll_step = plan.scroll_step,
            max_offset = plan.max_scroll_offset,
            sections = plan.total_sections,
            inner_root = !root.is_document(),
            "Capture planned"
        );

        // ScrollingToTop
        guard.enter(DriverState::ScrollingToTop);
        self.scroll_to_top(&root).await?;

        // The session must exist before the first frame arrives.
        self.orchestrator.start_session(plan.total_sections).await?;

        let mut report = CaptureReport::new(plan.total_sections);

        let offset = self.page.scroll_offset(&root).await?;
        self.capture_section(guard, 0, 0, offset, &mut report)
            .await?;

        for index in 1..plan.total_sections {
            guard.enter(DriverState::ScrollingToSection(index));
            let target = plan.target_offset(index);

            match self.scroll_to_section(&root, index, target).await? {
                Arrival::Reached => {
                    sleep(config.render_settle()).await;
                    let offset = self.page.scroll_offset(&root).await?;
                    self.capture_section(guard, index, target, offset, &mut report)
                        .await?;
                }
                Arrival::Stalled { reached } => {
                    report.record(index, target, SectionOutcome::Skipped { reached });
                }
            }
        }

        // Finishing
        guard.enter(DriverState::Finishing);
        sleep(config.finish_delay()).await;
        self.orchestrator.finish_session().await?;

        if let Err(e) = self.page.scroll_to_top_smooth(&root).await {
            debug!(error = %e, "Scroll back to top failed");
        }

        Ok(report)
    }

    /// Resets the page to offset 0, re-asserting once if it did not stick.
    async fn scroll_to_top(&self, root: &ScrollRoot) -> Result<()> {
        let config = self.config.as_ref();

        self.page.scroll_to(root, 0).await?;
        wait_for_settle(
            self.page.as_ref(),
            root,
            0,
            config.top_timeout(),
            &config.settle,
        )
        .await?;

        let offset = self.page.scroll_offset(root).await?;
        if offset > config.stuck_threshold_px {
            warn!(offset, "Could not scroll to top, re-asserting");
            self.page.scroll_to(root, 0).await?;
            sleep(config.top_reassert()).await;
        }
        Ok(())
    }

    /// Moves to `target` and waits for the page to settle.
    async fn scroll_to_section(
        &self,
        root: &ScrollRoot,
        index: u32,
        target: u32,
    ) -> Result<Arrival> {
        let config = self.config.as_ref();
        let previous = self.page.scroll_offset(root).await?;

        debug!(index, target, previous, "Scrolling to section");

        self.page.scroll_to(root, target).await?;
        self.page.flush_layout().await?;

        let settle = wait_for_settle(
            self.page.as_ref(),
            root,
            target,
            config.section_timeout(),
            &config.settle,
        )
        .await?;
        if let Settle::TimedOut { offset } = settle {
            debug!(index, target, offset, "Section scroll did not settle on target");
        }

        let current = self.page.scroll_offset(root).await?;
        if previous.abs_diff(current) >= config.stuck_threshold_px {
            return Ok(Arrival::Reached);
        }

        warn!(index, previous, current, "Scroll did not move, retrying");

        self.page
            .scroll_by(root, i64::from(target) - i64::from(current))
            .await?;
        self.page.scroll_to(root, target).await?;
        wait_for_settle(
            self.page.as_ref(),
            root,
            target,
            config.retry_timeout(),
            &config.settle,
        )
        .await?;

        let reached = self.page.scroll_offset(root).await?;
        if reached.abs_diff(target) > config.retry_tolerance_px {
            let stall = Error::scroll_stall(index, target, reached);
            warn!(error = %stall, "Skipping section");
            return Ok(Arrival::Stalled { reached });
        }
        Ok(Arrival::Reached)
    }

    /// Requests one capture and records the outcome.
    ///
    /// Only a vanished orchestrator aborts the run.
    async fn capture_section(
        &self,
        guard: &RunGuard,
        index: u32,
        target: u32,
        offset: u32,
        report: &mut CaptureReport,
    ) -> Result<()> {
        guard.enter(DriverState::CapturingSection(index));

        match self.orchestrator.capture_frame(index, offset).await {
            Ok(()) => {
                debug!(index, offset, "Section captured");
                report.record(index, target, SectionOutcome::Captured { offset });
                Ok(())
            }
            Err(Error::OrchestratorClosed) => Err(Error::OrchestratorClosed),
            Err(e) => {
                warn!(index, offset, error = %e, "Section capture failed, continuing");
                report.record(
                    index,
                    target,
                    SectionOutcome::Failed {
                        error: e.to_string(),
                    },
                );
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
