use glam::Vec2;

use crate::surface::Viewport;
use crate::types::LENS_CENTER;

/// Maps a pointer position in surface pixels onto normalized lens space.
///
/// The y axis is flipped so that `0` sits at the bottom edge, matching the UV
/// convention used by the shader. Values are deliberately left unclamped: a
/// pointer event racing a resize can land slightly outside `[0, 1]`, and the
/// lens transform copes with that on its own.
pub fn normalize_pointer(pixel_x: f64, pixel_y: f64, viewport: Viewport) -> Vec2 {
    let width = viewport.width.max(1) as f64;
    let height = viewport.height.max(1) as f64;
    Vec2::new((pixel_x / width) as f32, (1.0 - pixel_y / height) as f32)
}

/// Smoothed pointer: `target` follows raw events, `current` eases toward it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    current: Vec2,
    target: Vec2,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            current: LENS_CENTER,
            target: LENS_CENTER,
        }
    }
}

impl PointerState {
    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Records the latest observed pointer position. Never touches `current`.
    pub fn stage(&mut self, target: Vec2) {
        self.target = target;
    }

    /// Moves `current` a `factor` fraction of the way toward `target`.
    pub fn ease(&mut self, factor: f32) -> Vec2 {
        debug_assert!(factor > 0.0 && factor < 1.0, "smoothing factor out of range");
        self.current = self.current.lerp(self.target, factor);
        self.current
    }
}
