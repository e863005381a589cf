//! Shared geometry utilities.

use std::f64::consts::{FRAC_PI_2, PI};

use kurbo::{CubicBez, ParamCurve, ParamCurveArclen, Point};

/// Coordinates closer than this are treated as the same point.
const SAME_POINT_EPSILON: f64 = 1e-9;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Point at `factor` along the line from `from` to `to`.
///
/// Factors outside `0..=1` extrapolate past either end.
pub fn lengthen_line(from: Point, to: Point, factor: f64) -> Point {
    from + (to - from) * factor
}

/// Approximate arc length of a cubic.
pub fn cubic_arclen(curve: &CubicBez, accuracy: f64) -> f64 {
    curve.arclen(accuracy)
}

/// Split a cubic at parameter `t`, returning `(0..t, t..1)`.
///
/// `t` may fall outside `0..=1`; the halves then extrapolate the
/// underlying polynomial, which is what a negative or oversized
/// offset needs.
pub fn split_cubic(curve: &CubicBez, t: f64) -> (CubicBez, CubicBez) {
    (curve.subsegment(0.0..t), curve.subsegment(t..1.0))
}

/// Whether consecutive points all run along one line within `tol` radians.
///
/// Direction comes from the arctangent of each pair's slope, so a run and
/// its reversal count as the same line. Vertical pairs get the constant
/// π/2 instead of dividing by zero. Coincident pairs are skipped.
pub fn is_continuous(points: &[Point], tol: f64) -> bool {
    let angles: Vec<f64> = points
        .windows(2)
        .filter(|w| w[0].distance(w[1]) > SAME_POINT_EPSILON)
        .map(|w| slope_angle(w[0], w[1]))
        .collect();

    let Some(&general) = angles.first() else {
        return false;
    };
    angles.iter().all(|&a| {
        let d = (a - general).abs();
        d.min(PI - d) <= tol
    })
}

fn slope_angle(a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    if dx.abs() < SAME_POINT_EPSILON {
        FRAC_PI_2
    } else {
        ((b.y - a.y) / dx).atan()
    }
}

/// Round `v` to the nearest multiple of `grid`.
pub fn round_to_grid(v: f64, grid: f64) -> f64 {
    (v / grid).round() * grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic() -> CubicBez {
        CubicBez::new((0.0, 0.0), (0.0, 55.0), (45.0, 100.0), (100.0, 100.0))
    }

    #[test]
    fn lengthen_line_extrapolates() {
        let p = lengthen_line(Point::new(100.0, 0.0), Point::ZERO, 1.1);
        assert!((p.x + 10.0).abs() < 1e-12 && p.y.abs() < 1e-12);
        let q = lengthen_line(Point::ZERO, Point::new(0.0, 100.0), -0.1);
        assert!((q.y + 10.0).abs() < 1e-12);
    }

    #[test]
    fn split_halves_meet() {
        let (a, b) = split_cubic(&cubic(), 0.3);
        assert!(a.p3.distance(b.p0) < 1e-12);
        assert!(a.p0.distance(cubic().p0) < 1e-12);
        assert!(b.p3.distance(cubic().p3) < 1e-12);
    }

    #[test]
    fn split_beyond_one_extends_curve() {
        let c = cubic();
        let (a, _) = split_cubic(&c, 1.2);
        assert!(a.p3.distance(c.eval(1.2)) < 1e-9);
        assert!(a.p3.y > 100.0 || a.p3.x > 100.0);
    }

    #[test]
    fn arclen_is_between_chord_and_polygon() {
        let c = cubic();
        let len = cubic_arclen(&c, 1e-6);
        let chord = c.p0.distance(c.p3);
        let hull = c.p0.distance(c.p1) + c.p1.distance(c.p2) + c.p2.distance(c.p3);
        assert!(len > chord && len < hull, "{len} not in ({chord}, {hull})");
    }

    #[test]
    fn continuity_accepts_reversed_and_vertical_runs() {
        let horizontal = [
            Point::new(0.0, 100.0),
            Point::new(110.0, 100.0),
            Point::new(90.0, 100.0),
            Point::new(200.0, 100.0),
        ];
        assert!(is_continuous(&horizontal, 0.1));

        let vertical = [
            Point::new(100.0, 0.0),
            Point::new(100.0, 110.0),
            Point::new(100.0, 110.0),
            Point::new(100.0, 0.0),
        ];
        assert!(is_continuous(&vertical, 0.1));
    }

    #[test]
    fn continuity_rejects_corners() {
        let corner = [Point::new(0.0, 0.0), Point::new(0.0, 100.0), Point::new(100.0, 100.0)];
        assert!(!is_continuous(&corner, 0.1));
        let diagonal = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 20.0)];
        assert!(!is_continuous(&diagonal, 0.1));
        assert!(!is_continuous(&[Point::ZERO, Point::ZERO], 0.1));
    }

    #[test]
    fn rounds_to_grid() {
        assert_eq!(round_to_grid(13.0, 5.0), 15.0);
        assert_eq!(round_to_grid(-12.4, 5.0), -10.0);
        assert_eq!(round_to_grid(7.4, 1.0), 7.0);
    }
}
