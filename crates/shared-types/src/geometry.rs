//! 2D geometry primitives in drawing units
//!
//! Only what the compliance checks need: points, closed rings with a shoelace
//! area, axis-aligned bounds and the affine transforms used to place block
//! geometry into world coordinates.

use serde::{Deserialize, Serialize};

/// A point (or free vector) in drawing units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Closed ring of points, first == last
///
/// Construction closes the ring if the caller did not. Vertices are taken as
/// given: self-intersections are not detected, so [`Polygon::area`] is only
/// meaningful for simple polygons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point2D>,
}

impl Polygon {
    /// Build a closed ring from a vertex list, appending the first vertex if needed
    pub fn from_vertices<I>(vertices: I) -> Self
    where
        I: IntoIterator<Item = Point2D>,
    {
        let mut points: Vec<Point2D> = vertices.into_iter().collect();
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            if first != last {
                points.push(first);
            }
        }
        Self { points }
    }

    /// Points of the closed ring (first point repeated at the end)
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive edges `(p[i], p[i + 1])` of the ring
    pub fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Shoelace area, always non-negative
    ///
    /// Rings with fewer than 4 points (3 distinct vertices) have zero area.
    pub fn area(&self) -> f64 {
        if self.points.len() < 4 {
            return 0.0;
        }
        let twice: f64 = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        twice.abs() / 2.0
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl BoundingBox {
    /// Bounds of a point set, `None` when the set is empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2D>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Corners in the order (min,min), (min,max), (max,min), (max,max)
    pub fn corners(&self) -> [Point2D; 4] {
        [
            Point2D::new(self.min.x, self.min.y),
            Point2D::new(self.min.x, self.max.y),
            Point2D::new(self.max.x, self.min.y),
            Point2D::new(self.max.x, self.max.y),
        ]
    }

    /// Smallest box covering both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point2D::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2D::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Affine 2D transform: `p' = M * p + t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Block placement: move `base` to the origin, scale, rotate (degrees
    /// counter-clockwise), then move to `location`.
    pub fn placement(
        location: Point2D,
        base: Point2D,
        scale_x: f64,
        scale_y: f64,
        rotation_deg: f64,
    ) -> Self {
        let (sin, cos) = rotation_deg.to_radians().sin_cos();
        let a = cos * scale_x;
        let b = -sin * scale_y;
        let c = sin * scale_x;
        let d = cos * scale_y;
        Self {
            a,
            b,
            c,
            d,
            tx: location.x - (a * base.x + b * base.y),
            ty: location.y - (c * base.x + d * base.y),
        }
    }

    pub fn apply(&self, p: Point2D) -> Point2D {
        Point2D::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    /// Apply the linear part only (directions, axis vectors)
    pub fn apply_vector(&self, v: Point2D) -> Point2D {
        Point2D::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }

    /// `self` followed by `outer`
    pub fn then(&self, outer: &Transform2D) -> Transform2D {
        Transform2D {
            a: outer.a * self.a + outer.b * self.c,
            b: outer.a * self.b + outer.b * self.d,
            c: outer.c * self.a + outer.d * self.c,
            d: outer.c * self.b + outer.d * self.d,
            tx: outer.a * self.tx + outer.b * self.ty + outer.tx,
            ty: outer.c * self.tx + outer.d * self.ty + outer.ty,
        }
    }

    /// Mean linear scale factor, used for radii
    pub fn radius_scale(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }
}
