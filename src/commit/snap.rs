//! Grid snapping for committed coordinates.

use kurbo::Point;

use crate::geom::round_to_grid;
use crate::outline::Contour;

/// Snap one point to `grid`. A grid of 0 or less leaves it untouched.
pub fn point(p: Point, grid: f64) -> Point {
    if !(grid > 0.0) {
        return p;
    }
    Point::new(round_to_grid(p.x, grid), round_to_grid(p.y, grid))
}

/// Snap every point of `contour`, controls included, to `grid`.
pub fn to_grid(contour: &mut Contour, grid: f64) {
    if !(grid > 0.0) {
        return;
    }
    for p in contour.points_mut() {
        p.pos = point(p.pos, grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Outline;
    use kurbo::BezPath;

    #[test]
    fn snaps_all_points() {
        let mut p = BezPath::new();
        p.move_to((0.4, 0.0));
        p.line_to((10.6, 0.0));
        p.curve_to((12.2, 4.9), (8.51, 9.49), (0.0, 10.2));
        p.close_path();
        let mut outline = Outline::from_bezpaths(&[p]).unwrap();
        to_grid(&mut outline.contours[0], 1.0);
        for pt in outline.contours[0].points() {
            assert_eq!(pt.pos.x, pt.pos.x.round());
            assert_eq!(pt.pos.y, pt.pos.y.round());
        }
        assert_eq!(outline.contours[0].segments()[1].on.pos, Point::new(11.0, 0.0));
    }

    #[test]
    fn zero_grid_is_a_no_op() {
        assert_eq!(point(Point::new(1.26, -3.7), 0.0), Point::new(1.26, -3.7));
        assert_eq!(point(Point::new(1.26, -3.7), 0.5), Point::new(1.5, -3.5));
    }
}
