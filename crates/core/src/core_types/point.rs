//! Point and vector aliases for marker positions and velocities.

use nalgebra::Vector3;

/// 3D point type for marker locations, cell corners and raster vertices.
///
/// This is a simple alias for `nalgebra::Vector3<f64>`. The perimeter lives in the
/// horizontal plane, so most routines only look at `x` and `y` and carry `z` along.
pub type Point = Vector3<f64>;

/// Planar distance between two points, ignoring altitude.
#[inline]
pub fn planar_distance(a: &Point, b: &Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Linear interpolation between two points (`s` = 0 gives `a`, `s` = 1 gives `b`).
#[inline]
pub fn lerp(a: &Point, b: &Point, s: f64) -> Point {
    a + (b - a) * s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance_ignores_altitude() {
        let a = Point::new(0.0, 0.0, 10.0);
        let b = Point::new(3.0, 4.0, -50.0);
        assert_eq!(planar_distance(&a, &b), 5.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = lerp(&Point::new(0.0, 0.0, 0.0), &Point::new(10.0, -4.0, 2.0), 0.5);
        assert_eq!(mid, Point::new(5.0, -2.0, 1.0));
    }
}
