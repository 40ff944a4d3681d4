// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry value types and path helpers.
//!
//! Points, sizes, rectangles, affine transforms and Bézier paths are kurbo's
//! types. This module adds [`Angle`] and the handful of path queries the
//! drawables need: distance to an outline, containment under a fill rule,
//! and closed-interval rectangle tests.

use std::f64::consts::TAU;
use std::ops::{Add, Neg, Sub};

use kurbo::{BezPath, ParamCurveNearest, PathEl, Shape};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};
pub use lamina_imaging::FillRule;

/// An angle in radians, normalized to `[0, 2π)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    /// The zero angle.
    pub const ZERO: Self = Self(0.0);

    /// Creates an angle from radians, wrapping into `[0, 2π)`.
    #[must_use]
    pub fn from_radians(radians: f64) -> Self {
        let wrapped = radians.rem_euclid(TAU);
        // `rem_euclid` can round up to exactly TAU for tiny negative inputs.
        Self(if wrapped >= TAU { 0.0 } else { wrapped })
    }

    /// Creates an angle from degrees, wrapping into `[0°, 360°)`.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// The angle in radians.
    #[must_use]
    pub fn radians(self) -> f64 {
        self.0
    }

    /// The angle in degrees.
    #[must_use]
    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }

    /// A rotation about the origin by this angle.
    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::rotate(self.0)
    }
}

impl Add for Angle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_radians(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_radians(self.0 - rhs.0)
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_radians(-self.0)
    }
}

/// Returns `path` transformed by `transform`.
#[must_use]
pub fn transformed_path(path: &BezPath, transform: Affine) -> BezPath {
    let mut out = path.clone();
    out.apply_affine(transform);
    out
}

/// A rectangle as a closed four-point path after `transform`.
///
/// Unlike [`Affine::transform_rect_bbox`] this keeps rotation and shear, so
/// the result hugs the transformed rectangle.
#[must_use]
pub fn rect_path(rect: Rect, transform: Affine) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(transform * Point::new(rect.x0, rect.y0));
    path.line_to(transform * Point::new(rect.x1, rect.y0));
    path.line_to(transform * Point::new(rect.x1, rect.y1));
    path.line_to(transform * Point::new(rect.x0, rect.y1));
    path.close_path();
    path
}

/// Returns `true` if every subpath of `path` begins with a move-to.
#[must_use]
pub fn validate_path(path: &BezPath) -> bool {
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => open = true,
            PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..) => {
                if !open {
                    return false;
                }
            }
            PathEl::ClosePath => {
                if !open {
                    return false;
                }
                open = false;
            }
        }
    }
    true
}

/// Minimum distance from `pt` to the outline of `path`.
///
/// Closed subpaths include their closing segment. Returns `None` for a path
/// with no segments.
#[must_use]
pub fn path_distance(path: &BezPath, pt: Point, accuracy: f64) -> Option<f64> {
    path.segments()
        .map(|seg| seg.nearest(pt, accuracy).distance_sq)
        .min_by(f64::total_cmp)
        .map(f64::sqrt)
}

/// Returns `true` if `pt` lies within `half_width` of the outline of `path`.
///
/// A point at exactly `half_width` counts as inside.
#[must_use]
pub fn path_within(path: &BezPath, pt: Point, half_width: f64, accuracy: f64) -> bool {
    let limit_sq = half_width * half_width;
    path.segments()
        .any(|seg| seg.nearest(pt, accuracy).distance_sq <= limit_sq)
}

/// Returns `true` if `pt` is inside the region `path` encloses under `rule`.
#[must_use]
pub fn path_contains(path: &BezPath, pt: Point, rule: FillRule) -> bool {
    let winding = path.winding(pt);
    match rule {
        FillRule::NonZero => winding != 0,
        FillRule::EvenOdd => winding % 2 != 0,
    }
}

/// Closed-interval overlap test.
///
/// Touching edges count as overlapping, so zero-area bounds (for example the
/// bounds of a horizontal line) still intersect the rectangles around them.
#[must_use]
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    let a = a.abs();
    let b = b.abs();
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Returns `true` if `inner` lies entirely within `outer` (edges inclusive).
#[must_use]
pub fn rect_contains_rect(outer: Rect, inner: Rect) -> bool {
    let outer = outer.abs();
    let inner = inner.abs();
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Unions two optional rectangles.
#[must_use]
pub fn union_rects(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Uniform scale factor of the linear part of `transform`.
///
/// This is `sqrt(|det|)`: exact for similarity transforms and the geometric
/// mean of the axis scales otherwise.
#[must_use]
pub fn uniform_scale(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt()
}
