//! Ellipse rasterization and overlay drawing.
//!
//! Everything that turns an [`EllipseDescriptor`] back into pixels goes
//! through [`ellipse_contains`] and [`outline_points`], so the fitter and the
//! renderer agree on one angle convention: `rotation_angle` is the direction
//! of the major axis in degrees, measured from +x toward +y with y pointing
//! down. Pixel `(x, y)` is sampled at its integer coordinates, the same
//! coordinates the fitter sees on contour pixels.

use crate::types::EllipseDescriptor;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

/// Outline colour used for overlays
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline thickness in pixels used for overlays
pub const OVERLAY_THICKNESS: u32 = 3;

/// Centre, semi-axes and (sin, cos) of the rotation, in f64
fn geometry(desc: &EllipseDescriptor) -> (f64, f64, f64, f64, f64, f64) {
    let (sin, cos) = f64::from(desc.rotation_angle).to_radians().sin_cos();
    (
        f64::from(desc.center_x),
        f64::from(desc.center_y),
        f64::from(desc.major_axis) / 2.0,
        f64::from(desc.minor_axis) / 2.0,
        sin,
        cos,
    )
}

/// Whether the point `(x, y)` lies inside or on the ellipse
#[must_use]
pub fn ellipse_contains(desc: &EllipseDescriptor, x: f64, y: f64) -> bool {
    let (cx, cy, a, b, sin, cos) = geometry(desc);
    if a <= 0.0 || b <= 0.0 {
        return false;
    }
    let (dx, dy) = (x - cx, y - cy);
    let xr = dx * cos + dy * sin;
    let yr = -dx * sin + dy * cos;
    (xr / a).powi(2) + (yr / b).powi(2) <= 1.0
}

/// Filled binary mask of the ellipse: 255 inside, 0 outside
#[must_use]
pub fn rasterize_filled(desc: &EllipseDescriptor, width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if ellipse_contains(desc, f64::from(x), f64::from(y)) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Number of pixels of a `width` x `height` canvas inside the ellipse
#[must_use]
pub fn count_inside(desc: &EllipseDescriptor, width: u32, height: u32) -> u64 {
    rasterize_filled(desc, width, height)
        .as_raw()
        .iter()
        .filter(|&&v| v > 0)
        .count() as u64
}

/// `samples` points evenly spaced in parameter along the ellipse outline
#[must_use]
pub fn outline_points(desc: &EllipseDescriptor, samples: usize) -> Vec<(f32, f32)> {
    let (cx, cy, a, b, sin, cos) = geometry(desc);
    (0..samples)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / samples as f64;
            let (st, ct) = t.sin_cos();
            (
                (cx + a * cos * ct - b * sin * st) as f32,
                (cy + a * sin * ct + b * cos * st) as f32,
            )
        })
        .collect()
}

/// Copy of `image` with the ellipse outline drawn on top
#[must_use]
pub fn draw_overlay(
    image: &RgbImage,
    desc: &EllipseDescriptor,
    color: Rgb<u8>,
    thickness: u32,
) -> RgbImage {
    let mut canvas = image.clone();

    // Roughly one sample per pixel of circumference (Ramanujan's approximation)
    let (a, b) = (
        f64::from(desc.major_axis) / 2.0,
        f64::from(desc.minor_axis) / 2.0,
    );
    let h = ((a - b) / (a + b).max(f64::EPSILON)).powi(2);
    let perimeter =
        std::f64::consts::PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
    let samples = (perimeter.ceil() as usize).clamp(16, 20_000);

    let points = outline_points(desc, samples);
    let radius = (thickness / 2) as i32;
    for (i, &start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line_segment_mut(&mut canvas, start, end, color);
        if radius > 0 {
            draw_filled_circle_mut(
                &mut canvas,
                (start.0.round() as i32, start.1.round() as i32),
                radius,
                color,
            );
        }
    }
    canvas
}
