//! Session state owned by the orchestrator.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;

// ============================================================================
// CapturedFrame
// ============================================================================

/// One decoded viewport snapshot.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Zero-based section ordinal.
    pub index: u32,
    /// Decoded pixels.
    pub image: RgbaImage,
    /// Vertical scroll offset at capture time.
    pub scroll_offset: u32,
}

impl CapturedFrame {
    /// Creates a frame from decoded pixels.
    #[inline]
    #[must_use]
    pub fn new(index: u32, image: RgbaImage, scroll_offset: u32) -> Self {
        Self {
            index,
            image,
            scroll_offset,
        }
    }

    /// Decodes captured image bytes into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureFailed`] if the bytes are not a readable image.
    pub fn decode(index: u32, scroll_offset: u32, bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::capture_failed(index, format!("decode failed: {e}")))?
            .to_rgba8();
        Ok(Self::new(index, image, scroll_offset))
    }

    /// Frame width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

// ============================================================================
// FrameSet
// ============================================================================

/// Frames of one session keyed by index. An index is stored at most once.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    frames: BTreeMap<u32, CapturedFrame>,
}

impl FrameSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frame was captured.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns `true` if `index` is already present.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: u32) -> bool {
        self.frames.contains_key(&index)
    }

    /// Width shared by all frames, if any were captured.
    #[must_use]
    pub fn width(&self) -> Option<u32> {
        self.frames.values().next().map(CapturedFrame::width)
    }

    /// Inserts a frame unless its index is present.
    ///
    /// Returns `false` and drops `frame` on a duplicate; the stored frame
    /// is never overwritten.
    pub fn insert(&mut self, frame: CapturedFrame) -> bool {
        if self.frames.contains_key(&frame.index) {
            return false;
        }
        self.frames.insert(frame.index, frame);
        true
    }

    /// Frames in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &CapturedFrame> {
        self.frames.values()
    }

    /// Captured indices in ascending order.
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        self.frames.keys().copied().collect()
    }
}

// ============================================================================
// CaptureSession
// ============================================================================

/// One in-flight capture.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Session ID for logs.
    pub id: SessionId,
    /// Planned frame count, fixed at start.
    pub total_sections: u32,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Frames received so far.
    pub frames: FrameSet,
}

impl CaptureSession {
    /// Starts a session expecting `total_sections` frames.
    #[must_use]
    pub fn new(total_sections: u32) -> Self {
        Self {
            id: SessionId::generate(),
            total_sections,
            started_at: Utc::now(),
            frames: FrameSet::new(),
        }
    }

    /// Checks that `index` lies within the plan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSection`] when `index >= total_sections`.
    pub fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.total_sections {
            return Err(Error::invalid_section(index, self.total_sections));
        }
        Ok(())
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle of the orchestrator's single session slot.
///
/// `Empty → Active → Finishing → Empty`; any failure returns to `Empty`.
#[derive(Debug, Default)]
pub enum SessionState {
    /// No session.
    #[default]
    Empty,
    /// Accepting frames.
    Active(CaptureSession),
    /// Frames handed to the compositor.
    Finishing,
}

/// Phase of [`SessionState`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session.
    Empty,
    /// Accepting frames.
    Active,
    /// Compositing.
    Finishing,
}

/// Read-only view of the session slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// Planned sections of the active session.
    pub total_sections: Option<u32>,
    /// Captured indices in ascending order.
    pub captured: Vec<u32>,
}

impl SessionState {
    /// Returns the phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Empty => SessionPhase::Empty,
            Self::Active(_) => SessionPhase::Active,
            Self::Finishing => SessionPhase::Finishing,
        }
    }

    /// Returns a snapshot of the slot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        match self {
            Self::Active(session) => SessionSnapshot {
                phase: SessionPhase::Active,
                total_sections: Some(session.total_sections),
                captured: session.frames.indices(),
            },
            other => SessionSnapshot {
                phase: other.phase(),
                total_sections: None,
                captured: Vec::new(),
            },
        }
    }

    /// Installs a fresh session, returning the one it replaced.
    pub fn begin(&mut self, total_sections: u32) -> Option<CaptureSession> {
        match std::mem::replace(self, Self::Active(CaptureSession::new(total_sections))) {
            Self::Active(previous) => Some(previous),
            _ => None,
        }
    }

    /// Borrows the active session.
    #[must_use]
    pub fn active(&self) -> Option<&CaptureSession> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Mutably borrows the active session.
    pub fn active_mut(&mut self) -> Option<&mut CaptureSession> {
        match self {
            Self::Active(session) => Some(session),
            _ => None,
        }
    }

    /// Moves the active session out and enters `Finishing`.
    ///
    /// Leaves the state `Empty` and returns `None` if nothing was active.
    pub fn finish(&mut self) -> Option<CaptureSession> {
        match std::mem::take(self) {
            Self::Active(session) => {
                *self = Self::Finishing;
                Some(session)
            }
            _ => None,
        }
    }

    /// Drops any session, frames included.
    pub fn clear(&mut self) {
        *self = Self::Empty;
    }
}

// ============================================================================
// Tests
// ============================================================================
