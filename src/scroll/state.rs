//! Scroll driver state and its re-entrancy guard.
//!
//! ```text
//! Idle → Planning → ScrollingToTop → CapturingSection(0)
//!      → ScrollingToSection(1) → CapturingSection(1) → … → Finishing → Idle
//!
//! any state ──error──▶ Aborted ──guard dropped──▶ Idle
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// DriverState
// ============================================================================

/// Where the scroll driver is in a capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "section", rename_all = "camelCase")]
pub enum DriverState {
    /// No capture running; a start is accepted.
    #[default]
    Idle,
    /// Finding the scroll root and computing the plan.
    Planning,
    /// Resetting the scroll position to 0.
    ScrollingToTop,
    /// Waiting for the orchestrator to capture a section.
    CapturingSection(u32),
    /// Moving to and settling on a section's offset.
    ScrollingToSection(u32),
    /// Handing the frames over for stitching.
    Finishing,
    /// The run hit an unrecoverable error.
    Aborted,
}

impl DriverState {
    /// Returns `true` if a new start would be accepted.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Planning => f.write_str("planning"),
            Self::ScrollingToTop => f.write_str("scrolling to top"),
            Self::CapturingSection(i) => write!(f, "capturing section {i}"),
            Self::ScrollingToSection(i) => write!(f, "scrolling to section {i}"),
            Self::Finishing => f.write_str("finishing"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

// ============================================================================
// SharedState
// ============================================================================

/// Driver state shared between the driver and its observers.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<DriverState>>,
}

impl SharedState {
    /// Creates an idle state cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn get(&self) -> DriverState {
        *self.inner.lock()
    }

    /// Claims the driver for one run.
    ///
    /// The check and the `Idle → Planning` transition happen under one
    /// lock, so two callers can never both succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureInProgress`] unless the driver is idle.
    pub fn try_begin(&self) -> Result<RunGuard> {
        let mut state = self.inner.lock();
        if !state.is_idle() {
            return Err(Error::CaptureInProgress);
        }
        *state = DriverState::Planning;
        trace!(state = %*state, "Driver claimed");

        Ok(RunGuard {
            state: self.clone(),
        })
    }
}

// ============================================================================
// RunGuard
// ============================================================================

/// Exclusive claim on the driver for one run.
///
/// Dropping the guard returns the driver to [`DriverState::Idle`] on
/// every path: success, error, panic or task cancellation.
#[derive(Debug)]
pub struct RunGuard {
    state: SharedState,
}

impl RunGuard {
    /// Moves the run to `next`.
    pub fn enter(&self, next: DriverState) {
        let mut state = self.state.inner.lock();
        trace!(from = %*state, to = %next, "Driver transition");
        *state = next;
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn current(&self) -> DriverState {
        self.state.get()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *self.state.inner.lock() = DriverState::Idle;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_begin_claims_once() {
        let state = SharedState::new();
        let guard = state.try_begin().expect("first claim");
        assert_eq!(state.get(), DriverState::Planning);

        let err = state.try_begin().unwrap_err();
        assert!(matches!(err, Error::CaptureInProgress));

        drop(guard);
        assert!(state.get().is_idle());
        assert!(state.try_begin().is_ok());
    }

    #[test]
    fn test_guard_resets_after_abort() {
        let state = SharedState::new();
        {
            let guard = state.try_begin().expect("claim");
            guard.enter(DriverState::CapturingSection(2));
            assert_eq!(guard.current(), DriverState::CapturingSection(2));
            guard.enter(DriverState::Aborted);
            assert_eq!(state.get(), DriverState::Aborted);
            assert!(state.try_begin().is_err());
        }
        assert_eq!(state.get(), DriverState::Idle);
    }

    #[test]
    fn test_guard_resets_on_panic() {
        let state = SharedState::new();
        let cloned = state.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.try_begin().expect("claim");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(state.get().is_idle());
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(DriverState::ScrollingToSection(3).to_string(), "scrolling to section 3");
        let json = serde_json::to_value(DriverState::CapturingSection(1)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "state": "capturingSection", "section": 1 }));
        let json = serde_json::to_value(DriverState::Idle).expect("serialize");
        assert_eq!(json, serde_json::json!({ "state": "idle" }));
    }
}
