//! Deterministic synthetic display backend

use super::{DisplayInfo, DisplaySource};
use crate::error::{AgentError, Result};
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicU64, Ordering};

/// Synthetic displays filled with a per-capture shade
///
/// Each capture bumps a sequence counter, so two captures of the same display
/// produce different pixels, like a live screen would.
#[derive(Debug)]
pub struct SyntheticDisplaySource {
    displays: Vec<DisplayInfo>,
    failing: Option<usize>,
    sequence: AtomicU64,
    enumerations: AtomicU64,
}

impl SyntheticDisplaySource {
    /// `count` displays of identical size
    pub fn with_displays(count: usize, width: u32, height: u32) -> Self {
        let sizes = vec![(width, height); count];
        Self::with_sizes(&sizes)
    }

    /// One display per `(width, height)` entry, in order
    pub fn with_sizes(sizes: &[(u32, u32)]) -> Self {
        let displays = sizes
            .iter()
            .enumerate()
            .map(|(index, &(width, height))| DisplayInfo {
                index,
                name: format!("Synthetic Display {}", index + 1),
                width,
                height,
            })
            .collect();

        Self {
            displays,
            failing: None,
            sequence: AtomicU64::new(0),
            enumerations: AtomicU64::new(0),
        }
    }

    /// Make captures of the display at `index` fail
    pub fn failing_on(mut self, index: usize) -> Self {
        self.failing = Some(index);
        self
    }

    /// Number of captures served so far
    pub fn captures(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of times the display list was enumerated
    pub fn enumerations(&self) -> u64 {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticDisplaySource {
    fn default() -> Self {
        Self::with_displays(1, 4, 4)
    }
}

impl DisplaySource for SyntheticDisplaySource {
    fn displays(&self) -> Result<Vec<DisplayInfo>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Ok(self.displays.clone())
    }

    fn capture(&self, display: &DisplayInfo) -> Result<RgbaImage> {
        if self.failing == Some(display.index) {
            return Err(AgentError::Capture(format!(
                "synthetic failure on display {}",
                display.index
            )));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let shade = (sequence % 255) as u8;
        Ok(RgbaImage::from_pixel(
            display.width.max(1),
            display.height.max(1),
            Rgba([shade, shade, shade, 255]),
        ))
    }
}
