//! Browser tab automation and control.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Tab struct, accessors and command dispatch |
//! | `script` | JavaScript execution |
//! | `screenshot` | Visible-area capture, focus |
//! | `scroll` | Scroll root discovery, measurement and scrolling |
//!
//! # Example
//!
//! ```ignore
//! let tab = Tab::connect(server).await?;
//!
//! tab.focus().await?;
//! let png = tab.capture_visible_png().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod screenshot;
mod script;
mod scroll;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Tab;
