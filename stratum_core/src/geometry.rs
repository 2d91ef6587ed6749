// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape math shared by the walkers.
//!
//! Everything here is pure: bounding boxes, containment, stroke proximity,
//! and the pairwise region classification used by geometry hit-testing.
//! Curved outlines are flattened (via [`kurbo::flatten`]) before segment
//! tests; containment uses the exact winding of the original outline.

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape as _};
use stratum_wire::Geometry;

/// Flattening tolerance for outline tests, in drawing units.
const ACCURACY: f64 = 0.1;

/// How a test region relates to a piece of content.
///
/// The relation is stated from the test region's point of view: it can be
/// disjoint from the content, overlap it partially, lie entirely inside it,
/// or entirely contain it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntersectionDetail {
    /// The test region and the content are disjoint.
    Empty,
    /// The test region partially overlaps the content.
    Intersects,
    /// The test region lies entirely inside the content.
    FullyInside,
    /// The test region entirely contains the content.
    FullyContains,
}

/// Converts a geometry to a path outline.
#[must_use]
pub(crate) fn to_path(geometry: &Geometry) -> BezPath {
    match geometry {
        Geometry::Rect(r) => r.to_path(ACCURACY),
        Geometry::RoundedRect(rr) => rr.to_path(ACCURACY),
        Geometry::Ellipse(e) => e.to_path(ACCURACY),
        Geometry::Path(p) => p.clone(),
    }
}

/// The local-space bounding box of a geometry.
#[must_use]
pub(crate) fn bounds(geometry: &Geometry) -> Rect {
    match geometry {
        Geometry::Rect(r) => *r,
        Geometry::RoundedRect(rr) => rr.rect(),
        Geometry::Ellipse(e) => e.bounding_box(),
        Geometry::Path(p) => p.bounding_box(),
    }
}

/// Whether a geometry's filled region contains a point.
#[must_use]
pub(crate) fn contains(geometry: &Geometry, point: Point) -> bool {
    match geometry {
        Geometry::Rect(r) => r.contains(point),
        Geometry::RoundedRect(rr) => rr.contains(point),
        Geometry::Ellipse(e) => e.contains(point),
        Geometry::Path(p) => p.contains(point),
    }
}

/// Whether a geometry has no outline at all (e.g. an empty path).
#[must_use]
pub(crate) fn is_empty_outline(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Path(p) => p.elements().is_empty(),
        _ => false,
    }
}

/// The axis-aligned box covering `rect` mapped through `transform`.
///
/// A transformed rectangle is generally not axis-aligned; the result is the
/// box of its four mapped corners.
#[must_use]
pub(crate) fn transformed_rect_bounds(rect: Rect, transform: Affine) -> Rect {
    let corners = [
        transform * Point::new(rect.x0, rect.y0),
        transform * Point::new(rect.x1, rect.y0),
        transform * Point::new(rect.x1, rect.y1),
        transform * Point::new(rect.x0, rect.y1),
    ];
    let mut x0 = corners[0].x;
    let mut y0 = corners[0].y;
    let mut x1 = corners[0].x;
    let mut y1 = corners[0].y;
    for c in &corners[1..] {
        x0 = x0.min(c.x);
        y0 = y0.min(c.y);
        x1 = x1.max(c.x);
        y1 = y1.max(c.y);
    }
    Rect::new(x0, y0, x1, y1)
}

/// Whether any coordinate of `rect` is NaN.
#[must_use]
pub(crate) fn has_nan(rect: Rect) -> bool {
    rect.x0.is_nan() || rect.y0.is_nan() || rect.x1.is_nan() || rect.y1.is_nan()
}

/// Whether `rect` encloses a positive area.
#[must_use]
pub(crate) fn is_positive_area(rect: Rect) -> bool {
    rect.x1 > rect.x0 && rect.y1 > rect.y0
}

/// Flattens a path into closed polylines, one per subpath.
fn polylines(path: &BezPath) -> Vec<Vec<Point>> {
    let mut polys: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    kurbo::flatten(path.elements().iter().copied(), ACCURACY, |el| match el {
        PathEl::MoveTo(p) => {
            if current.len() > 1 {
                polys.push(core::mem::take(&mut current));
            } else {
                current.clear();
            }
            current.push(p);
        }
        PathEl::LineTo(p) => current.push(p),
        PathEl::ClosePath => {
            if current.len() > 1 {
                polys.push(core::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
        // flatten only emits MoveTo/LineTo/ClosePath.
        _ => {}
    });
    if current.len() > 1 {
        polys.push(current);
    }
    polys
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segments `a0a1` and `b0b1` touch or cross.
fn segments_intersect(a0: Point, a1: Point, b0: Point, b1: Point) -> bool {
    let d1 = orient(b0, b1, a0);
    let d2 = orient(b0, b1, a1);
    let d3 = orient(a0, a1, b0);
    let d4 = orient(a0, a1, b1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(b0, b1, a0))
        || (d2 == 0.0 && on_segment(b0, b1, a1))
        || (d3 == 0.0 && on_segment(a0, a1, b0))
        || (d4 == 0.0 && on_segment(a0, a1, b1))
}

/// Iterates the edges of a closed polyline, including the closing edge.
fn edges(poly: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = poly.len();
    (0..n).map(move |i| (poly[i], poly[(i + 1) % n]))
}

/// Classifies how the filled region of `test` relates to that of `other`.
///
/// Outlines are flattened and checked for edge crossings; with no crossing
/// the regions nest (or are disjoint), and mutual vertex containment decides
/// which. Shapes whose outlines coincide without a clean crossing are
/// reported as [`IntersectionDetail::Intersects`], the conservative answer.
#[must_use]
pub(crate) fn classify(test: &BezPath, other: &BezPath) -> IntersectionDetail {
    let test_polys = polylines(test);
    let other_polys = polylines(other);
    if test_polys.is_empty() || other_polys.is_empty() {
        return IntersectionDetail::Empty;
    }

    for tp in &test_polys {
        for op in &other_polys {
            for (a0, a1) in edges(tp) {
                for (b0, b1) in edges(op) {
                    if segments_intersect(a0, a1, b0, b1) {
                        return IntersectionDetail::Intersects;
                    }
                }
            }
        }
    }

    // No crossings: regions nest or are disjoint.
    let test_in_other = test_polys.iter().all(|tp| other.contains(tp[0]));
    let other_in_test = other_polys.iter().all(|op| test.contains(op[0]));
    match (test_in_other, other_in_test) {
        (true, false) => IntersectionDetail::FullyInside,
        (false, true) => IntersectionDetail::FullyContains,
        (true, true) => IntersectionDetail::Intersects,
        (false, false) => IntersectionDetail::Empty,
    }
}

fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Whether `point` lies within `half_width` of the outline of `path`.
#[must_use]
pub(crate) fn stroke_contains(path: &BezPath, point: Point, half_width: f64) -> bool {
    for poly in polylines(path) {
        for (a, b) in edges(&poly) {
            if point_segment_distance(point, a, b) <= half_width {
                return true;
            }
        }
    }
    false
}

/// Whether `point` lies within `half_width` of the segment `p0p1`.
#[must_use]
pub(crate) fn segment_stroke_contains(p0: Point, p1: Point, point: Point, half_width: f64) -> bool {
    point_segment_distance(point, p0, p1) <= half_width
}
