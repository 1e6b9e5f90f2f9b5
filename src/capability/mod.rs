//! Capabilities the capture core calls through.
//!
//! The core never touches a browser directly. It talks to three
//! collaborators:
//!
//! | Trait | Context | Provided by |
//! |-------|---------|-------------|
//! | [`PageContext`] | Page (scroll, measure) | [`Tab`](crate::Tab) |
//! | [`ViewportCapture`] | Privileged (screen pixels) | [`Tab`](crate::Tab) |
//! | [`DownloadSink`] | Privileged (files) | [`DirectoryDownloads`] |

// ============================================================================
// Submodules
// ============================================================================

mod download;

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use download::DirectoryDownloads;

// ============================================================================
// Page Types
// ============================================================================

/// The element whose scroll position moves page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollRoot {
    /// The document scrolling element (window scroll).
    Document,
    /// An inner overflow container, addressed by a token the page tagged it with.
    Element {
        /// Tag value identifying the element in the page.
        token: String,
        /// `scrollHeight - clientHeight` at discovery time.
        scrollable_height: u32,
    },
}

impl ScrollRoot {
    /// Returns `true` for the document root.
    #[inline]
    #[must_use]
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }
}

/// Dimensions measured at planning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetrics {
    /// Scroll root content height.
    pub content_height: u32,
    /// Viewport height.
    pub viewport_height: u32,
    /// Viewport width.
    pub viewport_width: u32,
}

// ============================================================================
// PageContext
// ============================================================================

/// Scrolling and measurement inside the captured page.
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Finds the element maximizing `scrollHeight - clientHeight` among
    /// overflow-scrollable elements, falling back to the document.
    async fn find_scroll_root(&self) -> Result<ScrollRoot>;

    /// Measures the scroll root and viewport.
    async fn measure(&self, root: &ScrollRoot) -> Result<PageMetrics>;

    /// Current vertical scroll offset of `root`.
    async fn scroll_offset(&self, root: &ScrollRoot) -> Result<u32>;

    /// Scrolls `root` to `offset` through every available scroll API.
    async fn scroll_to(&self, root: &ScrollRoot, offset: u32) -> Result<()>;

    /// Scrolls `root` by a relative amount.
    async fn scroll_by(&self, root: &ScrollRoot, delta: i64) -> Result<()>;

    /// Forces pending layout to flush.
    async fn flush_layout(&self) -> Result<()>;

    /// Starts a smooth scroll back to the top without waiting for it.
    async fn scroll_to_top_smooth(&self, root: &ScrollRoot) -> Result<()>;
}

// ============================================================================
// ViewportCapture
// ============================================================================

/// Captures exactly what the foreground tab shows right now.
///
/// There is no scroll parameter: callers must let the page settle first.
#[async_trait]
pub trait ViewportCapture: Send + Sync {
    /// Returns the visible viewport as PNG bytes.
    async fn capture_visible(&self) -> Result<Vec<u8>>;
}

// ============================================================================
// DownloadSink
// ============================================================================

/// Persists a byte stream under a name without prompting.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Saves `bytes` as `filename` and returns where it landed.
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}
