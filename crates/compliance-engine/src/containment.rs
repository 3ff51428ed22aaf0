//! Tolerant point-in-polygon test
//!
//! Doors in real drawings are seldom flush with the room outline, so a point
//! counts as contained when it is on an edge, strictly inside, or within
//! `edge_eps` of the boundary.

use shared_types::{Point2D, Polygon};

/// Tolerances for [`contains`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Bounding-box padding and collinearity bound for the on-edge test;
    /// also biases the ray-crossing comparison
    pub eps: f64,
    /// Maximum distance to the nearest edge
    pub edge_eps: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            eps: 0.05,
            edge_eps: 0.40,
        }
    }
}

/// Guards the crossing division for edges that are almost horizontal
const CROSSING_DENOM_BIAS: f64 = 1e-12;

/// True if `p` lies on the segment `a`-`b` within `eps`
///
/// The point must fall inside the segment's bounding box padded by `eps`, and
/// twice the area of the triangle (a, b, p) must not exceed `eps`.
pub fn point_on_segment(p: Point2D, a: Point2D, b: Point2D, eps: f64) -> bool {
    let (min_x, max_x) = (a.x.min(b.x) - eps, a.x.max(b.x) + eps);
    let (min_y, max_y) = (a.y.min(b.y) - eps, a.y.max(b.y) + eps);
    if p.x < min_x || p.x > max_x || p.y < min_y || p.y > max_y {
        return false;
    }
    let twice_area = ((b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)).abs();
    twice_area <= eps
}

/// Euclidean distance from `p` to the closed segment `a`-`b`
pub fn distance_to_segment(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point2D::new(a.x + t * dx, a.y + t * dy))
}

/// Smallest distance from `p` to any edge; infinite for rings without edges
pub fn distance_to_polygon(p: Point2D, polygon: &Polygon) -> f64 {
    polygon
        .edges()
        .map(|(a, b)| distance_to_segment(p, a, b))
        .fold(f64::INFINITY, f64::min)
}

/// Even-odd ray-crossing parity with a horizontal ray towards +x
///
/// The crossing abscissa is compared against `p.x - eps` rather than `p.x`.
/// A vertex lying exactly on the scanline is counted for the edge whose other
/// end is strictly above it (half-open rule `(y1 > y) != (y2 > y)`).
pub fn is_inside(p: Point2D, polygon: &Polygon, eps: f64) -> bool {
    let mut inside = false;
    for (a, b) in polygon.edges() {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y + CROSSING_DENOM_BIAS) + a.x;
            if x_cross >= p.x - eps {
                inside = !inside;
            }
        }
    }
    inside
}

/// On an edge, inside, or within `edge_eps` of the boundary
pub fn contains(p: Point2D, polygon: &Polygon, tolerance: Tolerance) -> bool {
    if polygon
        .edges()
        .any(|(a, b)| point_on_segment(p, a, b, tolerance.eps))
    {
        return true;
    }
    if is_inside(p, polygon, tolerance.eps) {
        return true;
    }
    distance_to_polygon(p, polygon) <= tolerance.edge_eps
}
