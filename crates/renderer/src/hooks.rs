use std::path::PathBuf;
use std::time::Instant;

use crate::assets::AssetLoadError;

/// Facts about the installed lens texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Notifications the window loop sends to outside collaborators.
///
/// Every method runs on the event thread and must return quickly. Nothing an
/// observer does can fail the loop.
pub trait FrameObserver {
    fn on_ready(&mut self, _info: &TextureInfo) {}

    fn on_error(&mut self, _error: &AssetLoadError) {}

    /// Pointer entered the window.
    fn on_hover(&mut self) {}

    /// Primary button pressed inside the window.
    fn on_click(&mut self) {}

    /// Text appended to the window title, polled every tick.
    fn status(&mut self, _now: Instant) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl FrameObserver for NullObserver {}

impl<T: FrameObserver + ?Sized> FrameObserver for Box<T> {
    fn on_ready(&mut self, info: &TextureInfo) {
        (**self).on_ready(info)
    }

    fn on_error(&mut self, error: &AssetLoadError) {
        (**self).on_error(error)
    }

    fn on_hover(&mut self) {
        (**self).on_hover()
    }

    fn on_click(&mut self) {
        (**self).on_click()
    }

    fn status(&mut self, now: Instant) -> Option<String> {
        (**self).status(now)
    }
}
