//! Dominant-region ellipse fitting.
//!
//! The fitter traces the outer boundaries of every foreground region in a
//! mask, keeps the one enclosing the largest area and fits a rotated ellipse
//! to its boundary pixels. Equal areas resolve to the boundary found first in
//! raster-scan order of its starting pixel.

pub mod conic;

use crate::error::{GeometryError, Result};
use crate::types::{EllipseDescriptor, Mask};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;
use std::collections::HashSet;
use tracing::trace;

pub use conic::{fit_ellipse_direct, FittedEllipse, MIN_FIT_POINTS};

/// Outer boundaries of all top-level foreground regions, in discovery order
#[must_use]
pub fn external_contours(mask: &Mask) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask.as_image())
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect()
}

/// Area enclosed by a closed polygon (shoelace formula, unsigned)
#[must_use]
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y))
        .sum();
    twice_area.abs() as f64 / 2.0
}

/// The contour with the largest enclosed area; the first one wins ties
#[must_use]
pub fn select_dominant_contour(contours: &[Contour<i32>]) -> Option<&Contour<i32>> {
    contours
        .iter()
        .map(|c| (contour_area(&c.points), c))
        .fold(None::<(f64, &Contour<i32>)>, |best, (area, c)| match best {
            Some((best_area, _)) if area <= best_area => best,
            _ => Some((area, c)),
        })
        .map(|(_, c)| c)
}

/// Boundary points with repeats removed, keeping first-visit order
fn distinct_points(points: &[Point<i32>]) -> Vec<[f64; 2]> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .filter(|p| seen.insert((p.x, p.y)))
        .map(|p| [f64::from(p.x), f64::from(p.y)])
        .collect()
}

/// Convert a fitted ellipse to a descriptor: full axis lengths and the
/// major-axis angle in degrees, normalised to `[0, 180)`.
pub fn to_descriptor(fit: &FittedEllipse) -> Result<EllipseDescriptor> {
    let mut angle = fit.angle.to_degrees().rem_euclid(180.0);
    if angle >= 180.0 {
        angle = 0.0;
    }
    EllipseDescriptor::new(
        fit.cx,
        fit.cy,
        2.0 * fit.semi_major,
        2.0 * fit.semi_minor,
        angle,
    )
}

/// Fit a rotated ellipse to the largest foreground region of `mask`.
///
/// # Errors
/// * `DegenerateGeometry(NoUsableRegion)` when the mask has no foreground
/// * `DegenerateGeometry(TooFewPoints)` when the dominant boundary has fewer
///   than five distinct points
/// * `DegenerateGeometry(NotAnEllipse)` when the boundary admits no ellipse,
///   or only one reaching far outside the boundary's bounding box
pub fn fit_ellipse(mask: &Mask) -> Result<EllipseDescriptor> {
    let contours = external_contours(mask);
    let dominant = select_dominant_contour(&contours).ok_or(GeometryError::NoUsableRegion)?;

    let points = distinct_points(&dominant.points);
    if points.len() < MIN_FIT_POINTS {
        return Err(GeometryError::TooFewPoints {
            needed: MIN_FIT_POINTS,
            got: points.len(),
        }
        .into());
    }

    trace!(
        contours = contours.len(),
        boundary_points = points.len(),
        "Fitting dominant contour"
    );

    let fit = fit_ellipse_direct(&points)?;
    to_descriptor(&fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, OvalError};
    use image::{GrayImage, Luma};

    fn disk_mask(width: u32, height: u32, disks: &[(f64, f64, f64)]) -> Mask {
        Mask::from_image(GrayImage::from_fn(width, height, |x, y| {
            let inside = disks.iter().any(|&(cx, cy, r)| {
                let (dx, dy) = (f64::from(x) - cx, f64::from(y) - cy);
                dx * dx + dy * dy <= r * r
            });
            Luma([if inside { 255 } else { 0 }])
        }))
    }

    #[test]
    fn test_empty_mask_has_no_usable_region() {
        let mask = Mask::from_image(GrayImage::new(32, 32));
        let err = fit_ellipse(&mask).unwrap_err();
        assert!(matches!(
            err,
            OvalError::DegenerateGeometry(GeometryError::NoUsableRegion)
        ));
    }

    #[test]
    fn test_tiny_region_is_degenerate() {
        let mut image = GrayImage::new(16, 16);
        for (x, y) in [(5, 5), (6, 5), (5, 6), (6, 6)] {
            image.put_pixel(x, y, Luma([255]));
        }
        let err = fit_ellipse(&Mask::from_image(image)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
        assert!(matches!(
            err,
            OvalError::DegenerateGeometry(GeometryError::TooFewPoints { needed: 5, got: 4 })
        ));
    }

    #[test]
    fn test_single_pixel_is_degenerate() {
        let mut image = GrayImage::new(8, 8);
        image.put_pixel(3, 3, Luma([1]));
        let err = fit_ellipse(&Mask::from_image(image)).unwrap_err();
        assert!(matches!(
            err,
            OvalError::DegenerateGeometry(GeometryError::TooFewPoints { got: 1, .. })
        ));
    }

    #[test]
    fn test_circle_fit() {
        let (cx, cy, r) = (100.0, 80.0, 40.0);
        let d = fit_ellipse(&disk_mask(200, 160, &[(cx, cy, r)])).unwrap();
        assert!((f64::from(d.center_x) - cx).abs() < 0.5, "{d:?}");
        assert!((f64::from(d.center_y) - cy).abs() < 0.5, "{d:?}");
        assert!((f64::from(d.major_axis) - 2.0 * r).abs() < 2.0, "{d:?}");
        assert!((f64::from(d.minor_axis) - 2.0 * r).abs() < 2.0, "{d:?}");
        assert!(d.major_axis >= d.minor_axis);
    }

    #[test]
    fn test_largest_region_wins() {
        let mask = disk_mask(240, 240, &[(180.0, 60.0, 12.0), (70.0, 150.0, 45.0)]);
        assert_eq!(external_contours(&mask).len(), 2);

        let d = fit_ellipse(&mask).unwrap();
        assert!((25.0..=115.0).contains(&d.center_x), "{d:?}");
        assert!((105.0..=195.0).contains(&d.center_y), "{d:?}");
    }

    #[test]
    fn test_holes_are_ignored() {
        // A ring: the inner hole boundary must not compete with the outer one
        let mut mask = disk_mask(120, 120, &[(60.0, 60.0, 40.0)]).into_image();
        for (x, y, px) in mask.enumerate_pixels_mut() {
            let (dx, dy) = (f64::from(x) - 60.0, f64::from(y) - 60.0);
            if dx * dx + dy * dy <= 15.0 * 15.0 {
                *px = Luma([0]);
            }
        }
        let mask = Mask::from_image(mask);
        assert_eq!(external_contours(&mask).len(), 1);
        let d = fit_ellipse(&mask).unwrap();
        assert!((d.major_axis - 80.0).abs() < 2.0, "{d:?}");
    }

    #[test]
    fn test_equal_areas_pick_first_found() {
        let mask = disk_mask(200, 100, &[(150.0, 50.0, 20.0), (50.0, 50.0, 20.0)]);
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 2);
        let dominant = select_dominant_contour(&contours).unwrap();
        assert!(std::ptr::eq(dominant, &contours[0]));
    }

    fn strip_mask(x_range: std::ops::Range<u32>, y_range: std::ops::Range<u32>) -> Mask {
        Mask::from_image(GrayImage::from_fn(100, 100, |x, y| {
            Luma([if x_range.contains(&x) && y_range.contains(&y) { 255 } else { 0 }])
        }))
    }

    fn foreground_bounds(mask: &Mask) -> (f64, f64, f64, f64) {
        let mut bounds = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y, px) in mask.as_image().enumerate_pixels() {
            if px[0] > 0 {
                let (x, y) = (f64::from(x), f64::from(y));
                bounds = (bounds.0.min(x), bounds.1.min(y), bounds.2.max(x), bounds.3.max(y));
            }
        }
        bounds
    }

    #[test]
    fn test_two_pixel_strips_are_degenerate() {
        for width in [20, 40] {
            let err = fit_ellipse(&strip_mask(10..10 + width, 40..42)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DegenerateGeometry, "width {width}: {err}");
        }
    }

    #[test]
    fn test_eccentric_ellipse_fit() {
        let truth = EllipseDescriptor::new(100.0, 90.0, 60.0, 10.0, 30.0).unwrap();
        let mask = Mask::from_image(crate::render::rasterize_filled(&truth, 200, 180));
        let d = fit_ellipse(&mask).unwrap();
        assert!((d.center_x - truth.center_x).abs() < 1.0, "{d:?}");
        assert!((d.center_y - truth.center_y).abs() < 1.0, "{d:?}");
        assert!((d.major_axis - truth.major_axis).abs() < 4.0, "{d:?}");
        assert!((d.rotation_angle - truth.rotation_angle).abs() < 3.0, "{d:?}");
    }

    #[test]
    fn test_thin_ellipses_never_yield_runaway_axes() {
        for major in [6.0, 12.0, 24.0] {
            for angle in (0..180).step_by(15) {
                let truth =
                    EllipseDescriptor::new(50.0, 50.0, major, 2.0, f64::from(angle)).unwrap();
                let mask = Mask::from_image(crate::render::rasterize_filled(&truth, 100, 100));
                let (min_x, min_y, max_x, max_y) = foreground_bounds(&mask);

                match fit_ellipse(&mask) {
                    Ok(d) => {
                        let diagonal = (max_x - min_x).hypot(max_y - min_y);
                        let limit = conic::MAX_AXIS_TO_EXTENT * diagonal + 1e-3;
                        assert!(f64::from(d.major_axis) <= limit, "{major} @ {angle}: {d:?}");
                        assert!((min_x..=max_x).contains(&f64::from(d.center_x)), "{d:?}");
                        assert!((min_y..=max_y).contains(&f64::from(d.center_y)), "{d:?}");
                    },
                    Err(err) => assert_eq!(err.kind(), ErrorKind::DegenerateGeometry),
                }
            }
        }
    }

    #[test]
    fn test_contour_area() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert!((contour_area(&square) - 100.0).abs() < f64::EPSILON);
        let reversed: Vec<_> = square.iter().rev().copied().collect();
        assert!((contour_area(&reversed) - 100.0).abs() < f64::EPSILON);
        assert!(contour_area(&square[..2]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_descriptor_normalises_angle() {
        let fit = FittedEllipse {
            cx: 1.0,
            cy: 2.0,
            semi_major: 10.0,
            semi_minor: 4.0,
            angle: -std::f64::consts::FRAC_PI_4,
        };
        let d = to_descriptor(&fit).unwrap();
        assert!((d.rotation_angle - 135.0).abs() < 1e-4);
        assert!((d.major_axis - 20.0).abs() < f32::EPSILON);
        assert!((d.minor_axis - 8.0).abs() < f32::EPSILON);
    }
}
