//! Stitches captured frames into one tall image and saves it.
//!
//! Frames are laid out top to bottom in index order. Every frame after
//! the first is drawn `overlap_px` rows higher than the previous frame's
//! bottom edge, so its top rows overwrite the rows both frames share:
//!
//! ```text
//! y = 0            ┌──────────┐
//!                  │ frame 0  │
//! y = h0 - ov      ├──────────┤ ← frame 1 top overwrites ov rows
//!                  │ frame 1  │
//! y = h0+h1-2ov    ├──────────┤
//!                  │ frame 2  │
//!                  └──────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::io::Cursor;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage, imageops};
use tracing::{debug, info};

use crate::capability::DownloadSink;
use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::orchestrator::CapturedFrame;

// ============================================================================
// Types
// ============================================================================

/// Composed output awaiting download.
#[derive(Debug, Clone)]
pub struct StitchedImage {
    /// Composed pixels.
    pub image: RgbaImage,
    /// Generated output filename.
    pub filename: String,
    /// Number of frames drawn.
    pub frame_count: usize,
}

/// A stitched image encoded as PNG, ready for the download sink.
#[derive(Debug, Clone)]
pub struct EncodedScreenshot {
    /// PNG bytes.
    pub bytes: Vec<u8>,
    /// Generated output filename.
    pub filename: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of frames drawn.
    pub frame_count: usize,
}

impl StitchedImage {
    /// Encodes the composed pixels as PNG.
    ///
    /// CPU-bound; callers on the async runtime run it under
    /// `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compositing`] if encoding fails.
    pub fn encode(self) -> Result<EncodedScreenshot> {
        let (width, height) = self.image.dimensions();
        let bytes = encode_png(&self.image)?;
        debug!(width, height, size = bytes.len(), "Stitched image encoded");

        Ok(EncodedScreenshot {
            bytes,
            filename: self.filename,
            width,
            height,
            frame_count: self.frame_count,
        })
    }
}

/// A stitched image that has been written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedScreenshot {
    /// Generated filename.
    pub filename: String,
    /// Where the download sink put it.
    pub path: PathBuf,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of frames stitched.
    pub frame_count: usize,
}

// ============================================================================
// Compositor
// ============================================================================

/// Vertical frame stitcher.
#[derive(Debug, Clone)]
pub struct Compositor {
    overlap_px: u32,
    filename_prefix: String,
}

impl Compositor {
    /// Creates a compositor.
    #[must_use]
    pub fn new(overlap_px: u32, filename_prefix: impl Into<String>) -> Self {
        Self {
            overlap_px,
            filename_prefix: filename_prefix.into(),
        }
    }

    /// Creates a compositor from capture configuration.
    #[must_use]
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.overlap_px, config.filename_prefix.clone())
    }

    /// Returns the overlap removed between frames.
    #[inline]
    #[must_use]
    pub fn overlap_px(&self) -> u32 {
        self.overlap_px
    }

    /// Output height for frames of the given heights, in draw order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compositing`] if there are no frames, a later
    /// frame is shorter than the overlap, or the total overflows.
    pub fn output_height(&self, heights: impl IntoIterator<Item = u32>) -> Result<u32> {
        let mut heights = heights.into_iter();
        let first = heights
            .next()
            .ok_or_else(|| Error::compositing("no frames to stitch"))?;

        let mut total = u64::from(first);
        for (k, height) in heights.enumerate() {
            if height < self.overlap_px {
                return Err(Error::compositing(format!(
                    "frame {} is {height}px tall, below the {}px overlap",
                    k + 1,
                    self.overlap_px
                )));
            }
            total += u64::from(height - self.overlap_px);
        }

        u32::try_from(total)
            .map_err(|_| Error::compositing(format!("output height {total}px overflows")))
    }

    /// Draws frames, sorted by index, onto one canvas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyResult`] for no frames and
    /// [`Error::Compositing`] for mismatched widths or bad heights.
    pub fn stitch<'a>(&self, frames: impl IntoIterator<Item = &'a CapturedFrame>) -> Result<RgbaImage> {
        let mut frames: Vec<&CapturedFrame> = frames.into_iter().collect();
        if frames.is_empty() {
            return Err(Error::EmptyResult);
        }
        frames.sort_by_key(|frame| frame.index);

        let width = frames[0].width();
        if let Some(odd) = frames.iter().find(|frame| frame.width() != width) {
            return Err(Error::compositing(format!(
                "frame {} is {}px wide, expected {width}px",
                odd.index,
                odd.width()
            )));
        }

        let height = self.output_height(frames.iter().map(|frame| frame.height()))?;
        let mut canvas = RgbaImage::new(width, height);

        let mut cursor: i64 = 0;
        for (position, frame) in frames.iter().enumerate() {
            if position > 0 {
                cursor -= i64::from(self.overlap_px);
            }
            imageops::replace(&mut canvas, &frame.image, 0, cursor);
            debug!(index = frame.index, y = cursor, "Frame drawn");
            cursor += i64::from(frame.height());
        }

        Ok(canvas)
    }

    /// Output filename for a capture taken at `at`.
    ///
    /// Format: `<prefix>_YYYY-MM-DDTHH-MM-SS.png` in UTC.
    #[must_use]
    pub fn filename(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}_{}.png",
            self.filename_prefix,
            at.format("%Y-%m-%dT%H-%M-%S")
        )
    }

    /// Stitches frames and names the result.
    pub fn compose<'a>(
        &self,
        frames: impl IntoIterator<Item = &'a CapturedFrame>,
        at: DateTime<Utc>,
    ) -> Result<StitchedImage> {
        let frames: Vec<&CapturedFrame> = frames.into_iter().collect();
        let frame_count = frames.len();
        let image = self.stitch(frames)?;

        Ok(StitchedImage {
            image,
            filename: self.filename(at),
            frame_count,
        })
    }

    /// Hands an encoded screenshot to the download sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Download`] (or whatever the sink returns) if saving
    /// fails.
    pub async fn deliver(
        &self,
        encoded: EncodedScreenshot,
        downloads: &dyn DownloadSink,
    ) -> Result<SavedScreenshot> {
        let path = downloads.save(&encoded.filename, &encoded.bytes).await?;

        info!(
            filename = %encoded.filename,
            width = encoded.width,
            height = encoded.height,
            frames = encoded.frame_count,
            "Screenshot saved"
        );

        Ok(SavedScreenshot {
            filename: encoded.filename,
            path,
            width: encoded.width,
            height: encoded.height,
            frame_count: encoded.frame_count,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encodes an image losslessly as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::compositing(format!("PNG encode failed: {e}")))?;
    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================
