//! Planar geometry kernels used by the scans and the frontier logic.
//!
//! Everything here is total: degenerate input (parallel segments, empty
//! polygons, zero-length edges) yields `None`, `false` or an infinite distance.

use crate::core_types::{Point, EPSILON_X};
use serde::{Deserialize, Serialize};

/// z-component of the planar cross product `a × b`.
#[inline]
pub fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Crossing-number point-in-polygon test on parallel vertex arrays.
///
/// The polygon is implicitly closed (last vertex connects to the first).
pub fn point_in_polygon(x: f64, y: f64, xs: &[f64], ys: &[f64]) -> bool {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        if (ys[i] > y) != (ys[j] > y) {
            let x_cross = (xs[j] - xs[i]) * (y - ys[i]) / (ys[j] - ys[i]) + xs[i];
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Shoelace area, positive for counter-clockwise winding (y up).
pub fn signed_area(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        twice += xs[j] * ys[i] - xs[i] * ys[j];
        j = i;
    }
    0.5 * twice
}

/// Distance from `(px, py)` to the segment `a`-`b`.
pub fn distance_to_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    if len2 <= f64::EPSILON {
        return (px - ax).hypot(py - ay);
    }
    let s = (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0);
    (px - (ax + s * dx)).hypot(py - (ay + s * dy))
}

/// Distance from `(x, y)` to the closest edge of a closed polygon.
pub fn distance_to_polygon(x: f64, y: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return f64::INFINITY;
    }
    if n == 1 {
        return (x - xs[0]).hypot(y - ys[0]);
    }
    let mut best = f64::INFINITY;
    let mut j = n - 1;
    for i in 0..n {
        best = best.min(distance_to_segment(x, y, xs[j], ys[j], xs[i], ys[i]));
        j = i;
    }
    best
}

/// Intersection of segments `a`-`b` and `c`-`d`.
///
/// Endpoints are accepted within [`EPSILON_X`]. Parallel, collinear or
/// non-crossing segments give `None`.
pub fn find_intersection(a: &Point, b: &Point, c: &Point, d: &Point) -> Option<Point> {
    let (rx, ry) = (b.x - a.x, b.y - a.y);
    let (sx, sy) = (d.x - c.x, d.y - c.y);
    let len_r = rx.hypot(ry);
    let len_s = sx.hypot(sy);
    if len_r < EPSILON_X || len_s < EPSILON_X {
        return None;
    }
    let denom = cross(rx, ry, sx, sy);
    if denom.abs() <= f64::EPSILON * len_r * len_s {
        return None;
    }
    let (qx, qy) = (c.x - a.x, c.y - a.y);
    let t = cross(qx, qy, sx, sy) / denom;
    let u = cross(qx, qy, rx, ry) / denom;
    let tol_t = EPSILON_X / len_r;
    let tol_u = EPSILON_X / len_s;
    if t < -tol_t || t > 1.0 + tol_t || u < -tol_u || u > 1.0 + tol_u {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    Some(a + (b - a) * t)
}

/// Axis-aligned rectangle given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sw: Point,
    pub ne: Point,
}

impl BoundingBox {
    pub fn new(sw: Point, ne: Point) -> Self {
        Self { sw, ne }
    }

    /// Smallest box holding every point, `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(*first, *first);
        for p in iter {
            bbox.sw.x = bbox.sw.x.min(p.x);
            bbox.sw.y = bbox.sw.y.min(p.y);
            bbox.ne.x = bbox.ne.x.max(p.x);
            bbox.ne.y = bbox.ne.y.max(p.y);
        }
        Some(bbox)
    }

    /// Box grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            sw: Point::new(self.sw.x - margin, self.sw.y - margin, self.sw.z),
            ne: Point::new(self.ne.x + margin, self.ne.y + margin, self.ne.z),
        }
    }

    pub fn width(&self) -> f64 {
        self.ne.x - self.sw.x
    }

    pub fn height(&self) -> f64 {
        self.ne.y - self.sw.y
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.sw.x && p.x <= self.ne.x && p.y >= self.sw.y && p.y <= self.ne.y
    }

    /// Corners in clockwise order starting at south-west: SW, NW, NE, SE.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.sw,
            Point::new(self.sw.x, self.ne.y, self.sw.z),
            self.ne,
            Point::new(self.ne.x, self.sw.y, self.sw.z),
        ]
    }

    /// Side `index` (0: SW→NW, 1: NW→NE, 2: NE→SE, 3: SE→SW).
    pub fn side(&self, index: usize) -> (Point, Point) {
        let corners = self.corners();
        (corners[index % 4], corners[(index + 1) % 4])
    }

    /// First side crossed by segment `a`-`b`, scanning sides in clockwise order.
    pub fn intersect_segment(&self, a: &Point, b: &Point) -> Option<(Point, usize)> {
        (0..4).find_map(|index| {
            let (c, d) = self.side(index);
            find_intersection(a, b, &c, &d).map(|p| (p, index))
        })
    }

    /// Clockwise arc length from the south-west corner to `p`, which lies on `side`.
    pub fn perimeter_position(&self, p: &Point, side: usize) -> f64 {
        let (w, h) = (self.width(), self.height());
        match side % 4 {
            0 => p.y - self.sw.y,
            1 => h + (p.x - self.sw.x),
            2 => h + w + (self.ne.y - p.y),
            _ => 2.0 * h + w + (self.ne.x - p.x),
        }
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }
}
