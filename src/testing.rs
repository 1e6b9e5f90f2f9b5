//! In-memory collaborators for unit tests.
//!
//! | Fake | Stands in for |
//! |------|---------------|
//! | [`SimulatedPage`] | A page with a fixed height and a scroll offset; also captures itself |
//! | [`ScriptedCapture`] | A capture primitive with scripted sizes and failures |
//! | [`MemoryDownloads`] | A download sink that keeps files in memory |

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::capability::{DownloadSink, PageContext, PageMetrics, ScrollRoot, ViewportCapture};
use crate::compositor::encode_png;
use crate::error::{Error, Result};
use crate::orchestrator::CapturedFrame;

// ============================================================================
// Frames
// ============================================================================

/// A single-colour frame.
pub(crate) fn solid_frame(index: u32, width: u32, height: u32, rgba: [u8; 4]) -> CapturedFrame {
    CapturedFrame::new(
        index,
        RgbaImage::from_pixel(width, height, Rgba(rgba)),
        index * height,
    )
}

/// Colour of absolute page row `row`, so frames reveal where they were taken.
pub(crate) fn row_colour(row: u32) -> Rgba<u8> {
    Rgba([(row % 256) as u8, ((row / 256) % 256) as u8, 0x80, 0xff])
}

// ============================================================================
// SimulatedPage
// ============================================================================

/// A page of fixed height whose scroll offset moves instantly.
#[derive(Debug)]
pub(crate) struct SimulatedPage {
    content_height: u32,
    viewport_height: u32,
    viewport_width: u32,
    root: ScrollRoot,
    scroll_limit: Option<u32>,
    ignored_scroll_calls: Vec<u32>,
    fail_measure: bool,
    read_latency: Duration,
    offset: Mutex<u32>,
    scripted_samples: Mutex<VecDeque<u32>>,
    scroll_calls: AtomicU32,
    scroll_log: Mutex<Vec<u32>>,
    capture_log: Mutex<Vec<u32>>,
    smooth_top: AtomicU32,
}

impl SimulatedPage {
    /// A document-scrolled page.
    pub(crate) fn new(content_height: u32, viewport_height: u32) -> Self {
        Self {
            content_height,
            viewport_height,
            viewport_width: 4,
            root: ScrollRoot::Document,
            scroll_limit: None,
            ignored_scroll_calls: Vec::new(),
            fail_measure: false,
            read_latency: Duration::ZERO,
            offset: Mutex::new(0),
            scripted_samples: Mutex::new(VecDeque::new()),
            scroll_calls: AtomicU32::new(0),
            scroll_log: Mutex::new(Vec::new()),
            capture_log: Mutex::new(Vec::new()),
            smooth_top: AtomicU32::new(0),
        }
    }

    /// Scrolls an inner container instead of the document.
    pub(crate) fn with_inner_root(mut self) -> Self {
        self.root = ScrollRoot::Element {
            token: "inner".to_string(),
            scrollable_height: self.max_offset(),
        };
        self
    }

    /// Offsets beyond `limit` are never reached.
    pub(crate) fn with_scroll_limit(mut self, limit: u32) -> Self {
        self.scroll_limit = Some(limit);
        self
    }

    /// The given `scroll_to` calls (zero-based) have no effect.
    pub(crate) fn ignoring_scroll_calls(mut self, calls: impl IntoIterator<Item = u32>) -> Self {
        self.ignored_scroll_calls = calls.into_iter().collect();
        self
    }

    /// Measurement fails as if the page were torn down.
    pub(crate) fn failing_measure(mut self) -> Self {
        self.fail_measure = true;
        self
    }

    /// Every offset read takes `latency`, like a slow bridge.
    pub(crate) fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = latency;
        self
    }

    /// Starts the page at `offset`.
    pub(crate) fn at_offset(self, offset: u32) -> Self {
        *self.offset.lock() = offset;
        self
    }

    /// Offsets reported by the next reads, before the real offset.
    pub(crate) fn with_samples(self, samples: impl IntoIterator<Item = u32>) -> Self {
        self.scripted_samples.lock().extend(samples);
        self
    }

    /// Every `scroll_to` target, in order.
    pub(crate) fn scroll_log(&self) -> Vec<u32> {
        self.scroll_log.lock().clone()
    }

    /// The offset of every capture taken, in order.
    pub(crate) fn capture_log(&self) -> Vec<u32> {
        self.capture_log.lock().clone()
    }

    /// Number of smooth scrolls to the top.
    pub(crate) fn smooth_top_calls(&self) -> u32 {
        self.smooth_top.load(Ordering::SeqCst)
    }

    fn max_offset(&self) -> u32 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn clamp(&self, offset: i64) -> u32 {
        let ceiling = self
            .scroll_limit
            .map_or(self.max_offset(), |limit| limit.min(self.max_offset()));
        offset.clamp(0, i64::from(ceiling)) as u32
    }
}

#[async_trait]
impl PageContext for SimulatedPage {
    async fn find_scroll_root(&self) -> Result<ScrollRoot> {
        Ok(self.root.clone())
    }

    async fn measure(&self, _root: &ScrollRoot) -> Result<PageMetrics> {
        if self.fail_measure {
            return Err(Error::script_error("document is not available"));
        }
        Ok(PageMetrics {
            content_height: self.content_height,
            viewport_height: self.viewport_height,
            viewport_width: self.viewport_width,
        })
    }

    async fn scroll_offset(&self, _root: &ScrollRoot) -> Result<u32> {
        if !self.read_latency.is_zero() {
            tokio::time::sleep(self.read_latency).await;
        }
        if let Some(sample) = self.scripted_samples.lock().pop_front() {
            return Ok(sample);
        }
        Ok(*self.offset.lock())
    }

    async fn scroll_to(&self, _root: &ScrollRoot, offset: u32) -> Result<()> {
        let call = self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        self.scroll_log.lock().push(offset);
        if !self.ignored_scroll_calls.contains(&call) {
            *self.offset.lock() = self.clamp(i64::from(offset));
        }
        Ok(())
    }

    async fn scroll_by(&self, _root: &ScrollRoot, delta: i64) -> Result<()> {
        let mut offset = self.offset.lock();
        *offset = self.clamp(i64::from(*offset) + delta);
        Ok(())
    }

    async fn flush_layout(&self) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_top_smooth(&self, _root: &ScrollRoot) -> Result<()> {
        self.smooth_top.fetch_add(1, Ordering::SeqCst);
        *self.offset.lock() = 0;
        Ok(())
    }
}

#[async_trait]
impl ViewportCapture for SimulatedPage {
    async fn capture_visible(&self) -> Result<Vec<u8>> {
        let offset = *self.offset.lock();
        self.capture_log.lock().push(offset);

        let image = RgbaImage::from_fn(self.viewport_width, self.viewport_height, |_, y| {
            row_colour(offset + y)
        });
        encode_png(&image)
    }
}

// ============================================================================
// ScriptedCapture
// ============================================================================

/// A capture primitive returning solid PNGs of scripted sizes.
#[derive(Debug)]
pub(crate) struct ScriptedCapture {
    sizes: Vec<(u32, u32)>,
    failing_calls: Vec<u32>,
    calls: AtomicU32,
}

impl ScriptedCapture {
    /// Every capture is `width × height`.
    pub(crate) fn solid(width: u32, height: u32) -> Self {
        Self::sized([(width, height)])
    }

    /// Call `n` returns `sizes[n]`; the last size repeats.
    pub(crate) fn sized(sizes: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self {
            sizes: sizes.into_iter().collect(),
            failing_calls: Vec::new(),
            calls: AtomicU32::new(0),
        }
    }

    /// The given calls (zero-based) fail.
    pub(crate) fn failing_on_calls(mut self, calls: impl IntoIterator<Item = u32>) -> Self {
        self.failing_calls = calls.into_iter().collect();
        self
    }

    /// Number of captures attempted.
    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewportCapture for ScriptedCapture {
    async fn capture_visible(&self) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_calls.contains(&call) {
            return Err(Error::protocol("tab is not visible"));
        }

        let slot = (call as usize).min(self.sizes.len().saturating_sub(1));
        let (width, height) = self.sizes.get(slot).copied().unwrap_or((1, 1));
        encode_png(&RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255])))
    }
}

// ============================================================================
// MemoryDownloads
// ============================================================================

/// A download sink keeping saved files in memory.
#[derive(Debug, Default)]
pub(crate) struct MemoryDownloads {
    files: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl MemoryDownloads {
    /// A sink whose every save fails.
    pub(crate) fn failing() -> Self {
        Self {
            files: Mutex::default(),
            fail: true,
        }
    }

    /// Saved `(filename, bytes)` pairs, in order.
    pub(crate) fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().clone()
    }
}

#[async_trait]
impl DownloadSink for MemoryDownloads {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        if self.fail {
            return Err(Error::download("disk full"));
        }
        self.files.lock().push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("memory").join(filename))
    }
}
