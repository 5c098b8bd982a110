//! Direct least-squares ellipse fit (Fitzgibbon et al. 1999, in the
//! numerically stable reduced form of Halir & Flusser 1998).
//!
//! The conic `A x² + B xy + C y² + D x + E y + F = 0` minimising the algebraic
//! error under the constraint `4AC - B² = 1` is always an ellipse when the
//! data admit one. Points are shifted to their centroid and scaled to unit
//! mean radius before fitting.

use crate::error::GeometryError;
use nalgebra::{Matrix2, Matrix3, Vector3};

/// Minimum number of points that determines a unique conic
pub const MIN_FIT_POINTS: usize = 5;

/// Largest accepted ratio of the full major axis to the bounding-box diagonal
/// of the fitted points
pub const MAX_AXIS_TO_EXTENT: f64 = 2.0;

/// Geometric ellipse in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedEllipse {
    pub cx: f64,
    pub cy: f64,
    /// Semi-axis along `angle`
    pub semi_major: f64,
    pub semi_minor: f64,
    /// Direction of the major axis from +x toward +y, radians
    pub angle: f64,
}

/// Fit an ellipse to a boundary point set
pub fn fit_ellipse_direct(points: &[[f64; 2]]) -> Result<FittedEllipse, GeometryError> {
    if points.len() < MIN_FIT_POINTS {
        return Err(GeometryError::TooFewPoints {
            needed: MIN_FIT_POINTS,
            got: points.len(),
        });
    }

    let (mean_x, mean_y, scale) = normalization(points);

    // Scatter blocks over quadratic terms q = [x², xy, y²] and linear terms l = [x, y, 1]
    let mut s1 = Matrix3::<f64>::zeros();
    let mut s2 = Matrix3::<f64>::zeros();
    let mut s3 = Matrix3::<f64>::zeros();
    for &[px, py] in points {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        let q = Vector3::new(x * x, x * y, y * y);
        let l = Vector3::new(x, y, 1.0);
        s1 += q * q.transpose();
        s2 += q * l.transpose();
        s3 += l * l.transpose();
    }

    // Collinear (or coincident) points leave the linear scatter singular
    let n = points.len() as f64;
    let s3_inv = (s3.determinant().abs() > 1e-9 * n.powi(3))
        .then(|| s3.try_inverse())
        .flatten()
        .ok_or_else(|| GeometryError::NotAnEllipse("boundary points are collinear".into()))?;
    let t = -(s3_inv * s2.transpose());
    let m = s1 + s2 * t;

    // Premultiply by the inverse of the constraint matrix [[0,0,2],[0,-1,0],[2,0,0]]
    let reduced = Matrix3::from_rows(&[
        m.row(2) * 0.5,
        m.row(1) * -1.0,
        m.row(0) * 0.5,
    ]);

    let quadratic = constrained_eigenvector(&reduced).ok_or_else(|| {
        GeometryError::NotAnEllipse("no eigenvector meets the ellipse constraint".into())
    })?;
    let linear = t * quadratic;

    let normalized = conic_to_ellipse(
        [quadratic[0], quadratic[1], quadratic[2], linear[0], linear[1], linear[2]],
    )?;

    let fit = FittedEllipse {
        cx: normalized.cx / scale + mean_x,
        cy: normalized.cy / scale + mean_y,
        semi_major: normalized.semi_major / scale,
        semi_minor: normalized.semi_minor / scale,
        angle: normalized.angle,
    };
    check_extent(points, &fit)?;
    Ok(fit)
}

/// Reject fits that escape the point set: a centre outside its bounding box,
/// or a major axis longer than [`MAX_AXIS_TO_EXTENT`] box diagonals.
///
/// Thin, nearly straight boundaries satisfy the ellipse constraint with an
/// almost parabolic conic whose axes run off to arbitrary lengths.
fn check_extent(points: &[[f64; 2]], fit: &FittedEllipse) -> Result<(), GeometryError> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &[x, y] in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let inside = (min_x..=max_x).contains(&fit.cx) && (min_y..=max_y).contains(&fit.cy);
    if !inside {
        return Err(GeometryError::NotAnEllipse(format!(
            "centre ({:.1}, {:.1}) lies outside the boundary",
            fit.cx, fit.cy
        )));
    }

    let diagonal = (max_x - min_x).hypot(max_y - min_y);
    if 2.0 * fit.semi_major > MAX_AXIS_TO_EXTENT * diagonal {
        return Err(GeometryError::NotAnEllipse(format!(
            "major axis {:.1} exceeds the boundary extent {diagonal:.1}",
            2.0 * fit.semi_major
        )));
    }
    Ok(())
}

/// Centroid and isotropic scale bringing the mean distance to the centroid to 1
fn normalization(points: &[[f64; 2]]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| (p[0] - mean_x).hypot(p[1] - mean_y))
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-12 { 1.0 / mean_dist } else { 1.0 };
    (mean_x, mean_y, scale)
}

/// Eigenvector of `m` satisfying `4 v0 v2 - v1² > 0`.
///
/// When several qualify the one with the smallest eigenvalue magnitude wins,
/// which is the minimum algebraic-error solution.
fn constrained_eigenvector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    // Characteristic polynomial λ³ - tr λ² + c1 λ - det
    let trace = m.trace();
    let c1 = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
        + m[(0, 0)] * m[(2, 2)]
        - m[(0, 2)] * m[(2, 0)]
        + m[(1, 1)] * m[(2, 2)]
        - m[(1, 2)] * m[(2, 1)];
    let det = m.determinant();

    real_cubic_roots(-trace, c1, -det)
        .into_iter()
        .filter_map(|lambda| {
            let v = null_vector(&(m - Matrix3::identity() * lambda))?;
            let constraint = 4.0 * v[0] * v[2] - v[1] * v[1];
            (constraint > 0.0).then_some((lambda.abs(), v))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, v)| v)
}

/// Null vector of a rank-2 matrix: the largest cross product of two rows
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        m.row(0).transpose(),
        m.row(1).transpose(),
        m.row(2).transpose(),
    ];
    let best = [
        rows[0].cross(&rows[1]),
        rows[0].cross(&rows[2]),
        rows[1].cross(&rows[2]),
    ]
    .into_iter()
    .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))?;

    let norm = best.norm();
    (norm > 1e-15 && norm.is_finite()).then(|| best / norm)
}

/// Real roots of the monic cubic `x³ + b x² + c x + d`
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    use std::f64::consts::PI;

    // Depressed form t³ + p t + q with x = t - b/3
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;
    let half_q = q / 2.0;
    let third_p = p / 3.0;
    let disc = half_q * half_q + third_p * third_p * third_p;

    if disc > 0.0 {
        let sqrt_disc = disc.sqrt();
        vec![(-half_q + sqrt_disc).cbrt() + (-half_q - sqrt_disc).cbrt() + shift]
    } else {
        let r = (-third_p).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-half_q / (r * r * r)).clamp(-1.0, 1.0)
        };
        let phi = cos_arg.acos();
        (0..3)
            .map(|k| 2.0 * r * ((phi + 2.0 * PI * f64::from(k)) / 3.0).cos() + shift)
            .collect()
    }
}

/// Geometric parameters of the conic `[A, B, C, D, E, F]`
pub(crate) fn conic_to_ellipse(coeffs: [f64; 6]) -> Result<FittedEllipse, GeometryError> {
    let [a, b, c, d, e, f] = coeffs;
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 || !disc.is_finite() {
        return Err(GeometryError::NotAnEllipse(format!(
            "conic discriminant {disc:e} is not negative"
        )));
    }

    let cx = (2.0 * c * d - b * e) / disc;
    let cy = (2.0 * a * e - b * d) / disc;
    let at_center = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;

    let quad = Matrix2::new(a, b / 2.0, b / 2.0, c).symmetric_eigen();
    let axes_sq = quad.eigenvalues.map(|lambda| -at_center / lambda);
    if axes_sq.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
        return Err(GeometryError::NotAnEllipse("imaginary ellipse".into()));
    }

    let (major_idx, minor_idx) = if axes_sq[0] >= axes_sq[1] { (0, 1) } else { (1, 0) };
    let direction = quad.eigenvectors.column(major_idx);

    Ok(FittedEllipse {
        cx,
        cy,
        semi_major: axes_sq[major_idx].sqrt(),
        semi_minor: axes_sq[minor_idx].sqrt(),
        angle: direction[1].atan2(direction[0]),
    })
}
