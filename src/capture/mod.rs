//! Display capture and screenshot encoding
//!
//! [`capture_all`] enumerates the active displays, grabs each framebuffer,
//! PNG-encodes it and base64-encodes the PNG bytes so it can be inlined into
//! HTML as a `data:` URI. Order follows the backend's enumeration order.
//!
//! Backends implement [`DisplaySource`]:
//! - `NativeDisplaySource` (default feature `native-capture`) uses the
//!   `screenshots` crate.
//! - [`SyntheticDisplaySource`] produces deterministic frames for tests.
//! - [`UnavailableDisplaySource`] is the fallback for headless builds without
//!   `native-capture`; every batch fails with a capture error.

#[cfg(feature = "native-capture")]
mod native;
mod synthetic;

#[cfg(feature = "native-capture")]
pub use native::NativeDisplaySource;
pub use synthetic::SyntheticDisplaySource;

use crate::config::CapturePolicy;
use crate::error::{AgentError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, warn};

/// One attached display as seen at enumeration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Position in the backend's enumeration order
    pub index: usize,
    /// Human-readable display name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Backend able to enumerate and capture displays
pub trait DisplaySource: Send + Sync {
    /// List active displays in a stable order
    fn displays(&self) -> Result<Vec<DisplayInfo>>;

    /// Capture the current framebuffer of one display
    fn capture(&self, display: &DisplayInfo) -> Result<RgbaImage>;

    /// Enumerate once and hand each display's frame to `visit`, in order
    ///
    /// Every frame of one call comes from the same enumeration. Returning
    /// [`ControlFlow::Break`] from `visit` ends the batch. Backends whose
    /// capture handles only live as long as an enumeration override this.
    fn capture_each(
        &self,
        visit: &mut dyn FnMut(&DisplayInfo, Result<RgbaImage>) -> ControlFlow<()>,
    ) -> Result<()> {
        for screen in self.displays()? {
            let frame = self.capture(&screen);
            if visit(&screen, frame).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// Encoded screenshots, one per captured display, in enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenshotSet {
    images: Vec<String>,
}

impl ScreenshotSet {
    /// Number of encoded screenshots
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no display was captured
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Iterate over base64-encoded PNGs
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(String::as_str)
    }

    /// Take ownership of the encoded PNGs
    pub fn into_vec(self) -> Vec<String> {
        self.images
    }
}

/// Capture and encode every active display
///
/// Under [`CapturePolicy::Abort`] the first failure discards the batch and is
/// returned. Under [`CapturePolicy::Skip`] failed displays are logged and left
/// out, so the set may be shorter than the display count.
pub fn capture_all(source: &dyn DisplaySource, policy: CapturePolicy) -> Result<ScreenshotSet> {
    let mut images = Vec::new();
    let mut failure = None;

    source.capture_each(&mut |screen: &DisplayInfo, frame: Result<RgbaImage>| {
        match (frame.and_then(|image| encode_image(&image)), policy) {
            (Ok(encoded), _) => {
                images.push(encoded);
                ControlFlow::Continue(())
            }
            (Err(e), CapturePolicy::Abort) => {
                warn!("Capture of display {} failed, aborting batch: {}", screen.index, e);
                failure = Some(e);
                ControlFlow::Break(())
            }
            (Err(e), CapturePolicy::Skip) => {
                warn!("Capture of display {} failed, skipping: {}", screen.index, e);
                ControlFlow::Continue(())
            }
        }
    })?;

    if let Some(e) = failure {
        return Err(e);
    }
    debug!("Captured {} display(s)", images.len());
    Ok(ScreenshotSet { images })
}

/// PNG-encode an image and return the PNG bytes as standard base64
pub fn encode_image(image: &RgbaImage) -> Result<String> {
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(STANDARD.encode(png.into_inner()))
}

/// Backend used when no real capture support is compiled in
#[derive(Debug, Default)]
pub struct UnavailableDisplaySource;

impl DisplaySource for UnavailableDisplaySource {
    fn displays(&self) -> Result<Vec<DisplayInfo>> {
        Err(AgentError::Capture(
            "display capture is not available in this build (enable the `native-capture` feature)"
                .to_string(),
        ))
    }

    fn capture(&self, display: &DisplayInfo) -> Result<RgbaImage> {
        Err(AgentError::Capture(format!(
            "display {} cannot be captured in this build",
            display.index
        )))
    }
}

/// Get the display source for this build
pub fn default_source() -> Arc<dyn DisplaySource> {
    #[cfg(feature = "native-capture")]
    {
        Arc::new(NativeDisplaySource::new())
    }

    #[cfg(not(feature = "native-capture"))]
    {
        Arc::new(UnavailableDisplaySource)
    }
}
