//! CPU rendition of the lens shader.
//!
//! Every step mirrors `LENS_FRAGMENT_GLSL` in `compile.rs` so the math can be
//! unit tested and used for still snapshots without a GPU. Keep the two in
//! lockstep when touching either.
//!
//! Known quirk kept on purpose: distance and mask use aspect-corrected
//! coordinates while the displacement direction uses the raw ones, which skews
//! the warp horizontally on non-square viewports.

use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::surface::Viewport;
use crate::types::ShaderParams;

/// Inner fraction of the lens radius that is fully masked in.
pub const INNER_RADIUS_FRACTION: f32 = 0.8;

/// Cubic Hermite step between `edge0` and `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Soft circular mask: 1 inside 80% of the radius, 0 beyond it.
pub fn lens_mask(dist: f32, lens_size: f32) -> f32 {
    1.0 - smoothstep(INNER_RADIUS_FRACTION * lens_size, lens_size, dist)
}

/// Scales the x component by the viewport aspect ratio.
pub fn aspect_correct(point: Vec2, resolution: Vec2) -> Vec2 {
    Vec2::new(point.x * (resolution.x / resolution.y), point.y)
}

/// Intermediate values of one fragment's lens evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensSample {
    pub dist: f32,
    pub lens_mask: f32,
    /// `(dist / lens_size)^bulge`; present inside the lens and never consumed.
    pub displacement: Option<f32>,
    pub distorted_uv: Vec2,
    pub aberration: f32,
}

impl LensSample {
    pub fn red_uv(&self) -> Vec2 {
        self.distorted_uv + Vec2::new(self.aberration, 0.0)
    }

    pub fn green_uv(&self) -> Vec2 {
        self.distorted_uv
    }

    pub fn blue_uv(&self) -> Vec2 {
        self.distorted_uv - Vec2::new(self.aberration, 0.0)
    }
}

pub fn evaluate(uv: Vec2, mouse: Vec2, resolution: Vec2, params: &ShaderParams) -> LensSample {
    let lens_size = params.lens_size();
    let bulge = params.bulge();

    let dist = aspect_correct(uv, resolution).distance(aspect_correct(mouse, resolution));
    let mask = lens_mask(dist, lens_size);

    let (displacement, distorted_uv) = if dist < lens_size {
        let displacement = (dist / lens_size).powf(bulge);
        let direction = (uv - mouse).normalize_or_zero();
        (
            Some(displacement),
            mouse + direction * (dist * (1.0 - bulge * 0.5)),
        )
    } else {
        (None, uv)
    };

    let aberration = mask * params.aberration_strength() * (dist / lens_size);

    LensSample {
        dist,
        lens_mask: mask,
        displacement,
        distorted_uv,
        aberration,
    }
}

/// Source of RGBA colors addressed by bottom-left-origin UVs.
pub trait TextureSampler {
    fn sample(&self, uv: Vec2) -> [f32; 4];
}

/// Composes the three per-channel reads of a lens sample.
pub fn shade<S: TextureSampler + ?Sized>(texture: &S, sample: &LensSample) -> [f32; 4] {
    let red = texture.sample(sample.red_uv())[0];
    let green = texture.sample(sample.green_uv())[1];
    let blue = texture.sample(sample.blue_uv())[2];
    [red, green, blue, 1.0]
}

/// Bilinear, clamp-to-edge sampler over a top-down RGBA image.
pub struct ImageSampler<'a> {
    image: &'a RgbaImage,
}

impl<'a> ImageSampler<'a> {
    pub fn new(image: &'a RgbaImage) -> Self {
        Self { image }
    }

    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let Rgba(px) = *self.image.get_pixel(x, y);
        [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        ]
    }
}

impl TextureSampler for ImageSampler<'_> {
    fn sample(&self, uv: Vec2) -> [f32; 4] {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return [0.0; 4];
        }
        let max_x = (width - 1) as f32;
        let max_y = (height - 1) as f32;
        let fx = (uv.x * width as f32 - 0.5).clamp(0.0, max_x);
        let fy = ((1.0 - uv.y) * height as f32 - 0.5).clamp(0.0, max_y);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = mix(self.texel(x0, y0), self.texel(x1, y0), tx);
        let bottom = mix(self.texel(x0, y1), self.texel(x1, y1), tx);
        mix(top, bottom, ty)
    }
}

fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Renders one frame of the effect on the CPU at `size`.
pub fn render_still(
    source: &RgbaImage,
    size: Viewport,
    mouse: Vec2,
    params: &ShaderParams,
) -> RgbaImage {
    let sampler = ImageSampler::new(source);
    let resolution = Vec2::new(size.width as f32, size.height as f32);
    RgbaImage::from_fn(size.width, size.height, |x, y| {
        let uv = Vec2::new(
            (x as f32 + 0.5) / resolution.x,
            1.0 - (y as f32 + 0.5) / resolution.y,
        );
        let sample = evaluate(uv, mouse, resolution, params);
        let color = shade(&sampler, &sample);
        Rgba(color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LENS_CENTER;

    fn params() -> ShaderParams {
        ShaderParams::new(0.4, 0.5, 0.03).unwrap()
    }

    /// Encodes the sampled coordinate into the color so reads can be checked.
    struct CoordinateSampler;

    impl TextureSampler for CoordinateSampler {
        fn sample(&self, uv: Vec2) -> [f32; 4] {
            [uv.x, uv.y, uv.x + uv.y, 1.0]
        }
    }

    #[test]
    fn smoothstep_matches_cubic_hermite() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((smoothstep(0.0, 1.0, 0.25) - 0.15625).abs() < 1e-6);
    }

    #[test]
    fn aspect_correction_stretches_horizontal_distance() {
        let sample = evaluate(
            Vec2::new(0.5, 0.5),
            Vec2::new(0.0, 0.5),
            Vec2::new(2.0, 1.0),
            &params(),
        );
        assert!((sample.dist - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mask_is_full_inside_inner_radius_and_empty_at_edge() {
        assert!((lens_mask(0.32, 0.4) - 1.0).abs() < 1e-6);
        assert_eq!(lens_mask(0.4, 0.4), 0.0);
        assert_eq!(lens_mask(0.0, 0.4), 1.0);
        assert_eq!(lens_mask(0.9, 0.4), 0.0);
    }

    #[test]
    fn mask_falls_monotonically_across_transition_band() {
        let mid = lens_mask(0.36, 0.4);
        assert!(mid > 0.0 && mid < 1.0);

        let mut previous = lens_mask(0.32, 0.4);
        for step in 1..=40 {
            let dist = 0.32 + 0.08 * step as f32 / 40.0;
            let value = lens_mask(dist, 0.4);
            assert!(value <= previous + 1e-7, "mask rose at dist {dist}");
            previous = value;
        }
    }

    #[test]
    fn aberration_vanishes_at_center() {
        for strength in [0.0, 0.03, 0.5, 4.0] {
            let params = ShaderParams::new(0.4, 0.5, strength).unwrap();
            let sample = evaluate(LENS_CENTER, LENS_CENTER, Vec2::new(1920.0, 1080.0), &params);
            assert_eq!(sample.dist, 0.0);
            assert_eq!(sample.aberration, 0.0);
        }
    }

    #[test]
    fn aberration_vanishes_outside_lens() {
        let sample = evaluate(
            Vec2::new(0.95, 0.95),
            Vec2::new(0.1, 0.1),
            Vec2::new(1.0, 1.0),
            &params(),
        );
        assert_eq!(sample.aberration, 0.0);
    }

    #[test]
    fn aberration_grows_toward_lens_edge() {
        let resolution = Vec2::new(1.0, 1.0);
        let near = evaluate(Vec2::new(0.55, 0.5), LENS_CENTER, resolution, &params());
        let far = evaluate(Vec2::new(0.75, 0.5), LENS_CENTER, resolution, &params());
        assert!(near.aberration > 0.0);
        assert!(far.aberration > near.aberration);
    }

    #[test]
    fn outside_the_lens_uv_is_untouched() {
        let resolution = Vec2::new(1600.0, 900.0);
        let mouse = Vec2::new(0.2, 0.3);
        for uv in [
            Vec2::new(0.9, 0.9),
            Vec2::new(0.2 + 0.4 * 900.0 / 1600.0, 0.3),
            Vec2::new(0.2, 0.7),
            Vec2::new(-0.5, 1.5),
        ] {
            let sample = evaluate(uv, mouse, resolution, &params());
            assert!(sample.dist >= 0.4 - 1e-6);
            if sample.dist >= 0.4 {
                assert_eq!(sample.distorted_uv, uv);
                assert!(sample.displacement.is_none());
            }
        }
    }

    #[test]
    fn direction_uses_uncorrected_coordinates() {
        let sample = evaluate(
            Vec2::new(0.55, 0.5),
            LENS_CENTER,
            Vec2::new(2.0, 1.0),
            &params(),
        );
        // corrected distance is 0.1 while the raw offset is only 0.05
        assert!((sample.dist - 0.1).abs() < 1e-6);
        assert!((sample.distorted_uv.x - 0.575).abs() < 1e-6);
        assert!((sample.distorted_uv.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn displacement_is_computed_but_not_applied() {
        let sample = evaluate(Vec2::new(0.6, 0.5), LENS_CENTER, Vec2::new(1.0, 1.0), &params());
        let displacement = sample.displacement.expect("inside lens");
        assert!((displacement - 0.25_f32.powf(0.5)).abs() < 1e-6);
        assert!((sample.distorted_uv.x - (0.5 + 0.1 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn center_of_lens_reads_unmodified_center_color() {
        let sample = evaluate(LENS_CENTER, LENS_CENTER, Vec2::new(1280.0, 800.0), &params());
        assert_eq!(sample.dist, 0.0);
        assert_eq!(sample.lens_mask, 1.0);
        assert_eq!(sample.aberration, 0.0);
        assert_eq!(sample.red_uv(), LENS_CENTER);
        assert_eq!(sample.green_uv(), LENS_CENTER);
        assert_eq!(sample.blue_uv(), LENS_CENTER);

        let color = shade(&CoordinateSampler, &sample);
        assert_eq!(color, [0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn channels_split_horizontally_by_aberration() {
        let sample = evaluate(Vec2::new(0.65, 0.5), LENS_CENTER, Vec2::new(1.0, 1.0), &params());
        let color = shade(&CoordinateSampler, &sample);
        let green_x = color[1];
        assert!((color[0] - (sample.distorted_uv.x + sample.aberration)).abs() < 1e-6);
        let blue = sample.blue_uv();
        assert!((color[2] - (blue.x + blue.y)).abs() < 1e-6);
        assert!(color[0] > sample.distorted_uv.x);
        assert!((green_x - 0.5).abs() < 1e-6);
        assert_eq!(color[3], 1.0);
    }

    #[test]
    fn image_sampler_clamps_to_edge() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let sampler = ImageSampler::new(&image);

        assert_eq!(sampler.sample(Vec2::new(-3.0, 0.5)), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(sampler.sample(Vec2::new(7.0, 0.5)), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(sampler.sample(Vec2::new(0.25, 9.0)), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn image_sampler_uses_bottom_left_origin() {
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 0, 255]));
        let sampler = ImageSampler::new(&image);

        assert_eq!(sampler.sample(Vec2::new(0.5, 0.0)), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(sampler.sample(Vec2::new(0.5, 1.0)), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn still_without_lens_coverage_reproduces_source() {
        let source = RgbaImage::from_fn(8, 4, |x, y| Rgba([(x * 30) as u8, (y * 60) as u8, 90, 255]));
        let still = render_still(&source, Viewport::new(8, 4), Vec2::new(50.0, 50.0), &params());
        assert_eq!(still, source);
    }

    #[test]
    fn still_of_flat_image_stays_flat() {
        let source = RgbaImage::from_pixel(16, 16, Rgba([40, 120, 200, 255]));
        let still = render_still(&source, Viewport::new(16, 16), LENS_CENTER, &params());
        assert!(still.pixels().all(|px| *px == Rgba([40, 120, 200, 255])));
    }
}
