//! Capture tuning and output configuration.
//!
//! The settle delays are empirical and page dependent, so every one of
//! them is a field here rather than a constant in the scroll driver.
//!
//! # Example
//!
//! ```ignore
//! use fullpage_capture::CaptureConfig;
//!
//! let config = CaptureConfig::new()
//!     .with_render_settle_ms(900)
//!     .with_download_dir("./shots");
//!
//! config.validate()?;
//! ```
//!
//! Configs can also be loaded from JSON; missing fields keep their
//! defaults:
//!
//! ```json
//! { "render_settle_ms": 900, "download_dir": "./shots" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Fraction of the viewport advanced per section (10% overlap budget).
pub const DEFAULT_SCROLL_STEP_RATIO: f64 = 0.9;

/// Rows the compositor assumes consecutive frames share.
pub const DEFAULT_OVERLAP_PX: u32 = 10;

/// Prefix of the generated output filename.
pub const DEFAULT_FILENAME_PREFIX: &str = "fullpage_screenshot";

// ============================================================================
// SettleConfig
// ============================================================================

/// Parameters of the scroll stability poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Distance from target still counted as arrived.
    pub tolerance_px: u32,

    /// Movement between samples below which a sample counts as stable.
    pub stable_delta_px: u32,

    /// Consecutive stable samples required.
    pub required_stable_samples: u32,

    /// Delay between samples (one animation frame).
    pub sample_interval_ms: u64,

    /// Delay before the first sample.
    pub initial_delay_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            tolerance_px: 10,
            stable_delta_px: 2,
            required_stable_samples: 3,
            sample_interval_ms: 16,
            initial_delay_ms: 50,
        }
    }
}

impl SettleConfig {
    /// Returns the sample interval.
    #[inline]
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Returns the delay before the first sample.
    #[inline]
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Number of samples that fit in `timeout`, at least one.
    #[must_use]
    pub fn max_attempts(&self, timeout: Duration) -> u32 {
        let interval = self.sample_interval_ms.max(1);
        let attempts = (timeout.as_millis() as u64) / interval;
        attempts.clamp(1, u64::from(u32::MAX)) as u32
    }
}

// ============================================================================
// CaptureConfig
// ============================================================================

/// Full-page capture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Fraction of the viewport height advanced per section.
    pub scroll_step_ratio: f64,

    /// Overlap removed between consecutive frames when stitching.
    pub overlap_px: u32,

    /// Wait before measuring the page.
    pub initial_delay_ms: u64,

    /// Settle timeout for the initial scroll to top.
    pub top_timeout_ms: u64,

    /// Wait after re-asserting scroll to top.
    pub top_reassert_ms: u64,

    /// Settle timeout for each section scroll.
    pub section_timeout_ms: u64,

    /// Settle timeout for the single retry of a stuck scroll.
    pub retry_timeout_ms: u64,

    /// Wait after each scroll so lazy content renders before capture.
    pub render_settle_ms: u64,

    /// Wait after the last section before finishing the session.
    pub finish_delay_ms: u64,

    /// Movement below which a scroll counts as stuck.
    pub stuck_threshold_px: u32,

    /// Distance from target a retried scroll may end at and still be captured.
    pub retry_tolerance_px: u32,

    /// Stability poll parameters.
    pub settle: SettleConfig,

    /// Directory stitched images are written to.
    pub download_dir: PathBuf,

    /// Output filename prefix.
    pub filename_prefix: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl CaptureConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scroll_step_ratio: DEFAULT_SCROLL_STEP_RATIO,
            overlap_px: DEFAULT_OVERLAP_PX,
            initial_delay_ms: 300,
            top_timeout_ms: 1500,
            top_reassert_ms: 500,
            section_timeout_ms: 3000,
            retry_timeout_ms: 2000,
            render_settle_ms: 600,
            finish_delay_ms: 500,
            stuck_threshold_px: 10,
            retry_tolerance_px: 50,
            settle: SettleConfig::default(),
            download_dir: PathBuf::from("."),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the JSON is malformed
    /// - [`Error::Config`] if the result fails validation
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - see [`from_json_str`](Self::from_json_str)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl CaptureConfig {
    /// Sets the scroll step ratio.
    #[inline]
    #[must_use]
    pub fn with_scroll_step_ratio(mut self, ratio: f64) -> Self {
        self.scroll_step_ratio = ratio;
        self
    }

    /// Sets the stitching overlap.
    #[inline]
    #[must_use]
    pub fn with_overlap_px(mut self, overlap_px: u32) -> Self {
        self.overlap_px = overlap_px;
        self
    }

    /// Sets the render settle delay.
    #[inline]
    #[must_use]
    pub fn with_render_settle_ms(mut self, ms: u64) -> Self {
        self.render_settle_ms = ms;
        self
    }

    /// Sets the per-section settle timeout.
    #[inline]
    #[must_use]
    pub fn with_section_timeout_ms(mut self, ms: u64) -> Self {
        self.section_timeout_ms = ms;
        self
    }

    /// Sets the stability poll parameters.
    #[inline]
    #[must_use]
    pub fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }

    /// Sets the output directory.
    #[inline]
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Sets the output filename prefix.
    #[inline]
    #[must_use]
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }
}

// ============================================================================
// Validation & Accessors
// ============================================================================

impl CaptureConfig {
    /// Checks the configuration for values the capture loop cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(self.scroll_step_ratio > 0.0 && self.scroll_step_ratio <= 1.0) {
            return Err(Error::config(format!(
                "scroll_step_ratio must be in (0, 1], got {}",
                self.scroll_step_ratio
            )));
        }
        if self.settle.required_stable_samples == 0 {
            return Err(Error::config("settle.required_stable_samples must be > 0"));
        }
        if self.filename_prefix.is_empty() {
            return Err(Error::config("filename_prefix must not be empty"));
        }
        if self
            .filename_prefix
            .contains(|c: char| matches!(c, '/' | '\\'))
        {
            return Err(Error::config(format!(
                "filename_prefix must not contain path separators: {}",
                self.filename_prefix
            )));
        }
        Ok(())
    }

    /// Wait before measuring the page.
    #[inline]
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Settle timeout for the scroll to top.
    #[inline]
    #[must_use]
    pub fn top_timeout(&self) -> Duration {
        Duration::from_millis(self.top_timeout_ms)
    }

    /// Wait after re-asserting scroll to top.
    #[inline]
    #[must_use]
    pub fn top_reassert(&self) -> Duration {
        Duration::from_millis(self.top_reassert_ms)
    }

    /// Settle timeout per section.
    #[inline]
    #[must_use]
    pub fn section_timeout(&self) -> Duration {
        Duration::from_millis(self.section_timeout_ms)
    }

    /// Settle timeout for the retry of a stuck scroll.
    #[inline]
    #[must_use]
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    /// Wait before each capture.
    #[inline]
    #[must_use]
    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    /// Wait before finishing the session.
    #[inline]
    #[must_use]
    pub fn finish_delay(&self) -> Duration {
        Duration::from_millis(self.finish_delay_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.overlap_px, 10);
        assert_eq!(config.render_settle(), Duration::from_millis(600));
        assert_eq!(config.top_timeout(), Duration::from_millis(1500));
        assert_eq!(config.filename_prefix, "fullpage_screenshot");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = CaptureConfig::new()
            .with_render_settle_ms(900)
            .with_overlap_px(0)
            .with_download_dir("/tmp/shots");

        assert_eq!(config.render_settle_ms, 900);
        assert_eq!(config.overlap_px, 0);
        assert_eq!(config.download_dir, PathBuf::from("/tmp/shots"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CaptureConfig::from_json_str(
            r#"{ "render_settle_ms": 250, "settle": { "tolerance_px": 4 } }"#,
        )
        .expect("valid config");

        assert_eq!(config.render_settle_ms, 250);
        assert_eq!(config.settle.tolerance_px, 4);
        assert_eq!(config.settle.required_stable_samples, 3);
        assert_eq!(config.section_timeout_ms, 3000);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let err = CaptureConfig::new()
            .with_scroll_step_ratio(1.5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        assert!(
            CaptureConfig::new()
                .with_scroll_step_ratio(0.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_prefix_with_separator_rejected() {
        let result = CaptureConfig::new()
            .with_filename_prefix("../escape")
            .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_max_attempts() {
        let settle = SettleConfig::default();
        assert_eq!(settle.max_attempts(Duration::from_millis(1600)), 100);
        assert_eq!(settle.max_attempts(Duration::ZERO), 1);
    }
}
