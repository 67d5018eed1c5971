//! Local differential geometry of a marker cycle.
//!
//! Normals point away from the burnt side: outward for a clockwise (expanding)
//! front, into the unburnt island for a counter-clockwise (contracting) one. In
//! both cases that is the left-hand side of the direction of travel along `next`.

use crate::config::{CurvatureScheme, NormalScheme};
use crate::core_types::Point;
use crate::geometry::cross;

/// Outward unit normal at `loc`; zero for a degenerate neighbourhood.
pub fn compute_normal(prev: &Point, loc: &Point, next: &Point, scheme: NormalScheme) -> Point {
    let (tx, ty) = match scheme {
        NormalScheme::Medians => {
            let (ax, ay) = unit(loc.x - prev.x, loc.y - prev.y);
            let (bx, by) = unit(next.x - loc.x, next.y - loc.y);
            (ax + bx, ay + by)
        }
        NormalScheme::WeightedMedians => (next.x - prev.x, next.y - prev.y),
    };
    let (nx, ny) = unit(-ty, tx);
    Point::new(nx, ny, 0.0)
}

/// Signed curvature at `loc`, positive where the burnt side is convex.
pub fn compute_curvature(prev: &Point, loc: &Point, next: &Point, scheme: CurvatureScheme) -> f64 {
    let (ax, ay) = (loc.x - prev.x, loc.y - prev.y);
    let (bx, by) = (next.x - loc.x, next.y - loc.y);
    let la = ax.hypot(ay);
    let lb = bx.hypot(by);
    if la <= f64::EPSILON || lb <= f64::EPSILON {
        return 0.0;
    }
    // clockwise turning is negative in a y-up frame
    let turn = cross(ax, ay, bx, by);
    match scheme {
        CurvatureScheme::Circumradius => {
            let lc = (next.x - prev.x).hypot(next.y - prev.y);
            if lc <= f64::EPSILON {
                return 0.0;
            }
            -2.0 * turn / (la * lb * lc)
        }
        CurvatureScheme::Angle => {
            let angle = turn.atan2(ax * bx + ay * by);
            -angle / (0.5 * (la + lb))
        }
    }
}

fn unit(x: f64, y: f64) -> (f64, f64) {
    let len = x.hypot(y);
    if len <= f64::EPSILON {
        (0.0, 0.0)
    } else {
        (x / len, y / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_points_outward_on_clockwise_square() {
        // corner (0, 1) of the clockwise square (0,0) (0,1) (1,1) (1,0)
        let n = compute_normal(
            &Point::new(0.0, 0.0, 0.0),
            &Point::new(0.0, 1.0, 0.0),
            &Point::new(1.0, 1.0, 0.0),
            NormalScheme::Medians,
        );
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(n.x, -s, epsilon = 1e-12);
        assert_relative_eq!(n.y, s, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_normal_on_straight_edge() {
        let n = compute_normal(
            &Point::new(0.0, 0.0, 0.0),
            &Point::new(1.0, 0.0, 0.0),
            &Point::new(5.0, 0.0, 0.0),
            NormalScheme::WeightedMedians,
        );
        assert_relative_eq!(n.y, 1.0);
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let p = Point::new(2.0, 2.0, 0.0);
        assert_eq!(compute_normal(&p, &p, &p, NormalScheme::Medians), Point::zeros());
    }

    #[test]
    fn test_circumradius_curvature_on_circle() {
        // three points of a radius-10 circle traversed clockwise
        let r: f64 = 10.0;
        let at = |deg: f64| {
            let a = deg.to_radians();
            Point::new(r * a.cos(), r * a.sin(), 0.0)
        };
        let k = compute_curvature(&at(100.0), &at(90.0), &at(80.0), CurvatureScheme::Circumradius);
        assert_relative_eq!(k, 0.1, epsilon = 1e-9);
        let k_rev = compute_curvature(&at(80.0), &at(90.0), &at(100.0), CurvatureScheme::Circumradius);
        assert_relative_eq!(k_rev, -0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_curvature_straight_line_is_zero() {
        let k = compute_curvature(
            &Point::new(0.0, 0.0, 0.0),
            &Point::new(1.0, 0.0, 0.0),
            &Point::new(2.0, 0.0, 0.0),
            CurvatureScheme::Angle,
        );
        assert_eq!(k, 0.0);
    }
}
