//! Bounded scroll stability polling.
//!
//! A scroll has settled when the offset is within `tolerance_px` of the
//! target and has moved less than `stable_delta_px` for
//! `required_stable_samples` consecutive samples. Sampling stops once
//! `timeout` has elapsed since the wait began, or after
//! `timeout / sample_interval` attempts, whichever comes first.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace, warn};

use crate::capability::{PageContext, ScrollRoot};
use crate::config::SettleConfig;
use crate::error::Result;

// ============================================================================
// Settle
// ============================================================================

/// How a settle wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// On target and stable.
    Settled {
        /// Last sampled offset.
        offset: u32,
    },
    /// Timed out within twice the tolerance of the target.
    CloseEnough {
        /// Last sampled offset.
        offset: u32,
    },
    /// Timed out away from the target.
    TimedOut {
        /// Last sampled offset.
        offset: u32,
    },
}

impl Settle {
    /// Last sampled offset.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u32 {
        match *self {
            Self::Settled { offset } | Self::CloseEnough { offset } | Self::TimedOut { offset } => {
                offset
            }
        }
    }

    /// Returns `true` unless the wait timed out away from the target.
    #[inline]
    #[must_use]
    pub fn is_on_target(&self) -> bool {
        !matches!(self, Self::TimedOut { .. })
    }
}

// ============================================================================
// wait_for_settle
// ============================================================================

/// Polls `root` until its offset settles on `target` or `timeout` runs out.
///
/// Never fails on a timeout; the outcome says how close the page got.
/// Time spent reading the offset counts against `timeout`.
///
/// # Errors
///
/// Propagates failures reading the offset from the page.
pub async fn wait_for_settle(
    page: &dyn PageContext,
    root: &ScrollRoot,
    target: u32,
    timeout: Duration,
    config: &SettleConfig,
) -> Result<Settle> {
    let start = Instant::now();
    let max_attempts = config.max_attempts(timeout);
    let mut last: Option<u32> = None;
    let mut stable = 0u32;

    sleep(config.initial_delay()).await;

    for attempt in 0..max_attempts {
        let current = page.scroll_offset(root).await?;

        if last.is_some_and(|previous| previous.abs_diff(current) < config.stable_delta_px) {
            stable += 1;
        } else {
            stable = 0;
        }
        last = Some(current);

        let distance = current.abs_diff(target);
        trace!(attempt, current, target, distance, stable, "Settle sample");

        if distance <= config.tolerance_px && stable >= config.required_stable_samples {
            debug!(target, offset = current, attempt, "Scroll settled");
            return Ok(Settle::Settled { offset: current });
        }

        sleep(config.sample_interval()).await;

        if start.elapsed() >= timeout {
            trace!(attempt, "Settle deadline reached");
            break;
        }
    }

    let offset = match last {
        Some(offset) => offset,
        None => page.scroll_offset(root).await?,
    };
    let distance = offset.abs_diff(target);

    if distance <= config.tolerance_px.saturating_mul(2) {
        debug!(target, offset, distance, "Scroll close enough");
        Ok(Settle::CloseEnough { offset })
    } else {
        warn!(target, offset, stable, "Scroll settle timed out");
        Ok(Settle::TimedOut { offset })
    }
}

// ============================================================================
// Tests
// ============================================================================
