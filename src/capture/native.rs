//! Real display capture through the `screenshots` crate

use super::{DisplayInfo, DisplaySource};
use crate::error::{AgentError, Result};
use image::RgbaImage;
use screenshots::Screen;
use std::ops::ControlFlow;
use tracing::debug;

/// Captures the displays attached to this host
///
/// Screens are re-enumerated once per batch, so hot-plugged monitors are
/// picked up by the next dashboard render while one render always pairs each
/// display with the screen it was enumerated as.
#[derive(Debug, Default)]
pub struct NativeDisplaySource;

impl NativeDisplaySource {
    /// Create a new native source
    pub fn new() -> Self {
        Self
    }

    fn screens() -> Result<Vec<Screen>> {
        let screens = Screen::all()
            .map_err(|error| AgentError::Capture(format!("screen enumeration failed: {error}")))?;
        debug!("OS reported {} screen(s)", screens.len());
        Ok(screens)
    }

    fn grab(index: usize, screen: &Screen) -> Result<RgbaImage> {
        let captured = screen.capture().map_err(|error| {
            AgentError::Capture(format!("display {} capture failed: {error}", index))
        })?;

        // `screenshots` links its own `image` version; move the raw RGBA bytes over.
        let width = captured.width();
        let height = captured.height();
        frame_from_raw(index, width, height, captured.into_raw())
    }
}

/// Describe the screen at `index` from its reported size
pub(crate) fn describe(index: usize, width: u32, height: u32) -> DisplayInfo {
    DisplayInfo {
        index,
        name: format!("Display {}", index + 1),
        width: width.max(1),
        height: height.max(1),
    }
}

/// Wrap a raw RGBA buffer, rejecting buffers that do not match the size
pub(crate) fn frame_from_raw(
    index: usize,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
) -> Result<RgbaImage> {
    RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        AgentError::Capture(format!(
            "display {} returned a {}x{} buffer of the wrong size",
            index, width, height
        ))
    })
}

impl DisplaySource for NativeDisplaySource {
    fn displays(&self) -> Result<Vec<DisplayInfo>> {
        Ok(Self::screens()?
            .iter()
            .enumerate()
            .map(|(index, screen)| {
                describe(
                    index,
                    screen.display_info.width as u32,
                    screen.display_info.height as u32,
                )
            })
            .collect())
    }

    fn capture(&self, display: &DisplayInfo) -> Result<RgbaImage> {
        let screens = Self::screens()?;
        let screen = screens.get(display.index).ok_or_else(|| {
            AgentError::Capture(format!(
                "display {} is not available anymore",
                display.index
            ))
        })?;
        Self::grab(display.index, screen)
    }

    fn capture_each(
        &self,
        visit: &mut dyn FnMut(&DisplayInfo, Result<RgbaImage>) -> ControlFlow<()>,
    ) -> Result<()> {
        for (index, screen) in Self::screens()?.iter().enumerate() {
            let info = describe(
                index,
                screen.display_info.width as u32,
                screen.display_info.height as u32,
            );
            if visit(&info, Self::grab(index, screen)).is_break() {
                break;
            }
        }
        Ok(())
    }
}
