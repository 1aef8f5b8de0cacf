use winit::dpi::PhysicalSize;

/// Size of the drawable buffer the lens pass renders into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn as_resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<PhysicalSize<u32>> for Viewport {
    fn from(size: PhysicalSize<u32>) -> Self {
        Viewport::new(size.width, size.height)
    }
}

/// Window size paired with the (possibly smaller) drawable size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSizing {
    /// Swapchain size; always the window's physical size.
    pub window: PhysicalSize<u32>,
    /// Lens render size after the device pixel ratio cap.
    pub drawable: Viewport,
}

impl SurfaceSizing {
    /// Derives the drawable buffer from a window size and its scale factor.
    ///
    /// When `scale_factor` exceeds `max_device_pixel_ratio` the drawable shrinks
    /// to what the capped ratio would produce, bounding per-fragment cost on
    /// very dense displays.
    pub fn compute(window: PhysicalSize<u32>, scale_factor: f64, max_device_pixel_ratio: f64) -> Self {
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let effective = scale_factor.min(max_device_pixel_ratio.max(1.0));
        let ratio = effective / scale_factor;
        let drawable = if ratio < 1.0 {
            Viewport::new(
                (window.width as f64 * ratio).round() as u32,
                (window.height as f64 * ratio).round() as u32,
            )
        } else {
            Viewport::from(window)
        };
        Self { window, drawable }
    }

    pub fn is_scaled(&self) -> bool {
        self.drawable.width != self.window.width || self.drawable.height != self.window.height
    }

    pub fn is_empty(&self) -> bool {
        self.window.width == 0 || self.window.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_native_size_under_the_cap() {
        let sizing = SurfaceSizing::compute(PhysicalSize::new(2560, 1440), 2.0, 2.0);
        assert_eq!(sizing.drawable, Viewport::new(2560, 1440));
        assert!(!sizing.is_scaled());

        let sizing = SurfaceSizing::compute(PhysicalSize::new(1280, 720), 1.0, 2.0);
        assert_eq!(sizing.drawable, Viewport::new(1280, 720));
    }

    #[test]
    fn caps_dense_displays_at_two() {
        let sizing = SurfaceSizing::compute(PhysicalSize::new(3000, 1500), 3.0, 2.0);
        assert_eq!(sizing.drawable, Viewport::new(2000, 1000));
        assert!(sizing.is_scaled());
        assert_eq!(sizing.window, PhysicalSize::new(3000, 1500));
    }

    #[test]
    fn preserves_aspect_when_scaling() {
        let sizing = SurfaceSizing::compute(PhysicalSize::new(3840, 2160), 4.0, 2.0);
        assert_eq!(sizing.drawable, Viewport::new(1920, 1080));
        assert!((sizing.drawable.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn ignores_nonsense_scale_factors() {
        let sizing = SurfaceSizing::compute(PhysicalSize::new(800, 600), 0.0, 2.0);
        assert_eq!(sizing.drawable, Viewport::new(800, 600));
    }

    #[test]
    fn viewport_never_collapses_to_zero() {
        let viewport = Viewport::new(0, 0);
        assert_eq!(viewport.width, 1);
        assert_eq!(viewport.height, 1);
    }
}
