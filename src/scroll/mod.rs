//! Scroll driver: the page-side half of a capture.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | [`DriverState`] and the re-entrancy guard |
//! | `settle` | Bounded scroll stability polling |
//! | `report` | Per-section outcomes of a run |
//! | `driver` | [`ScrollDriver`], the run itself |
//!
//! # Example
//!
//! ```ignore
//! let driver = ScrollDriver::new(page, orchestrator, Arc::new(CaptureConfig::new()));
//!
//! let report = driver.run().await?;
//! println!("captured {:?}, skipped {:?}", report.captured(), report.skipped());
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod driver;
mod report;
mod settle;
mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use driver::ScrollDriver;
pub use report::{CaptureReport, SectionOutcome, SectionReport};
pub use settle::{Settle, wait_for_settle};
pub use state::{DriverState, RunGuard, SharedState};
