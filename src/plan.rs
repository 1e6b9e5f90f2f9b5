//! Section planning geometry.
//!
//! Splits a page into viewport-sized sections that overlap by
//! `viewport - step` pixels, with the last section pinned to the
//! bottom of the page.

use crate::error::{Error, Result};

// ============================================================================
// ScrollPlan
// ============================================================================

/// Section layout for one capture, fixed at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    /// Scrollable content height, never less than the viewport.
    pub page_height: u32,
    /// Visible viewport height.
    pub viewport_height: u32,
    /// Distance between consecutive section offsets.
    pub scroll_step: u32,
    /// Largest reachable scroll offset.
    pub max_scroll_offset: u32,
    /// Number of sections to capture.
    pub total_sections: u32,
}

impl ScrollPlan {
    /// Computes the plan for a page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Planning`] when the viewport has no height.
    pub fn compute(content_height: u32, viewport_height: u32, step_ratio: f64) -> Result<Self> {
        if viewport_height == 0 {
            return Err(Error::planning("viewport height is zero"));
        }

        let page_height = content_height.max(viewport_height);
        let scroll_step = ((f64::from(viewport_height) * step_ratio).floor() as u32).max(1);
        let max_scroll_offset = page_height - viewport_height;

        let total_sections = if max_scroll_offset == 0 {
            1
        } else {
            let mut total = page_height.div_ceil(scroll_step);
            if u64::from(total - 1) * u64::from(scroll_step) < u64::from(max_scroll_offset) {
                total += 1;
            }
            total
        };

        Ok(Self {
            page_height,
            viewport_height,
            scroll_step,
            max_scroll_offset,
            total_sections,
        })
    }

    /// Returns `true` if the page is taller than one viewport.
    #[inline]
    #[must_use]
    pub fn needs_scrolling(&self) -> bool {
        self.total_sections > 1
    }

    /// Target scroll offset of section `index`.
    ///
    /// The last section always lands exactly on the bottom.
    #[must_use]
    pub fn target_offset(&self, index: u32) -> u32 {
        if index == 0 {
            return 0;
        }
        if index + 1 >= self.total_sections {
            return self.max_scroll_offset;
        }
        let offset = u64::from(index) * u64::from(self.scroll_step);
        offset.min(u64::from(self.max_scroll_offset)) as u32
    }

    /// Target offsets of every section in order.
    pub fn offsets(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.total_sections).map(|index| self.target_offset(index))
    }
}

// ============================================================================
// Tests
// ============================================================================
