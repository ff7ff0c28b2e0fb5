//! Polygon containment.
//!
//! Even-odd ray casting over a single closed ring. Points are tested in
//! `(x, y) = (lng, lat)` space with no projection; geofences are small enough
//! that planar treatment of degrees is what the rest of the system expects.
//!
//! Boundary behaviour is deterministic but not symmetric: a point on a
//! vertical edge counts as inside when the edge lies to its right and
//! outside when it lies to its left.

use crate::coord::{Coordinate, Polygon};

/// Returns true when `point` lies inside `polygon`.
///
/// Rings with fewer than three vertices never contain anything.
pub fn contains(point: &Coordinate, polygon: &Polygon) -> bool {
    if polygon.is_degenerate() {
        return false;
    }
    ray_cast(point.to_lng_lat(), polygon.vertices().iter().map(Coordinate::to_lng_lat))
}

/// Same as [`contains`] for a raw `[lng, lat]` ring.
pub fn contains_lng_lat(point: &Coordinate, ring: &[[f64; 2]]) -> bool {
    if ring.len() < Polygon::MIN_VERTICES {
        return false;
    }
    ray_cast(point.to_lng_lat(), ring.iter().map(|p| (p[0], p[1])))
}

fn ray_cast<I>((x, y): (f64, f64), ring: I) -> bool
where
    I: Iterator<Item = (f64, f64)> + Clone,
{
    // Start with the closing edge: previous vertex is the last one.
    let Some(mut prev) = ring.clone().last() else {
        return false;
    };

    let mut inside = false;
    for current in ring {
        let (xi, yi) = current;
        let (xj, yj) = prev;
        if crosses(x, y, xi, yi, xj, yj) {
            inside = !inside;
        }
        prev = current;
    }
    inside
}

#[inline]
fn crosses(x: f64, y: f64, xi: f64, yi: f64, xj: f64, yj: f64) -> bool {
    if (yi > y) == (yj > y) {
        return false;
    }
    let dy = yj - yi;
    if dy == 0.0 {
        return false;
    }
    x < (xj - xi) * (y - yi) / dy + xi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_lng_lat(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]])
    }

    /// `(x, y)` helper so tests read in the same order as the rings.
    fn pt(lng: f64, lat: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    #[test]
    fn test_square_inside() {
        assert!(contains(&pt(5.0, 5.0), &square()));
    }

    #[test]
    fn test_square_outside() {
        assert!(!contains(&pt(15.0, 5.0), &square()));
        assert!(!contains(&pt(-1.0, 5.0), &square()));
        assert!(!contains(&pt(5.0, 11.0), &square()));
        assert!(!contains(&pt(5.0, -0.5), &square()));
    }

    #[test]
    fn test_square_left_edge_is_stable() {
        let square = square();
        let first = contains(&pt(0.0, 5.0), &square);
        for _ in 0..10 {
            assert_eq!(contains(&pt(0.0, 5.0), &square), first);
        }
        // The right-hand vertical edge is crossed, the left one is not.
        assert!(first);
        assert!(!contains(&pt(10.0, 5.0), &square));
    }

    #[test]
    fn test_degenerate_rings_never_contain() {
        let origin = pt(0.0, 0.0);
        assert!(!contains(&origin, &Polygon::default()));
        assert!(!contains(&origin, &Polygon::from_lng_lat(&[[0.0, 0.0]])));
        assert!(!contains(
            &pt(0.5, 0.5),
            &Polygon::from_lng_lat(&[[0.0, 0.0], [1.0, 1.0]])
        ));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening to the north.
        let u = Polygon::from_lng_lat(&[
            [0.0, 0.0],
            [6.0, 0.0],
            [6.0, 6.0],
            [4.0, 6.0],
            [4.0, 2.0],
            [2.0, 2.0],
            [2.0, 6.0],
            [0.0, 6.0],
        ]);
        assert!(contains(&pt(1.0, 4.0), &u));
        assert!(contains(&pt(5.0, 4.0), &u));
        assert!(contains(&pt(3.0, 1.0), &u));
        assert!(!contains(&pt(3.0, 4.0), &u));
    }

    #[test]
    fn test_horizontal_edge_through_point_does_not_divide_by_zero() {
        let poly = Polygon::from_lng_lat(&[[0.0, 5.0], [10.0, 5.0], [10.0, 10.0], [0.0, 10.0]]);
        let result = contains(&pt(5.0, 5.0), &poly);
        assert_eq!(result, contains(&pt(5.0, 5.0), &poly));
        assert!(contains(&pt(5.0, 7.0), &poly));
    }

    #[test]
    fn test_raw_ring_matches_polygon() {
        let ring = [[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]];
        for p in [pt(5.0, 5.0), pt(15.0, 5.0), pt(0.0, 5.0), pt(9.9, 0.1)] {
            assert_eq!(contains_lng_lat(&p, &ring), contains(&p, &square()));
        }
        assert!(!contains_lng_lat(&pt(0.0, 0.0), &ring[..2]));
    }

    #[test]
    fn test_real_world_fence() {
        // Rough block around Plaza de Armas, Santiago.
        let fence = Polygon::from_lng_lat(&[
            [-70.6520, -33.4370],
            [-70.6490, -33.4370],
            [-70.6490, -33.4390],
            [-70.6520, -33.4390],
        ]);
        assert!(contains(&Coordinate::new(-33.4380, -70.6505), &fence));
        assert!(!contains(&Coordinate::new(-33.4400, -70.6505), &fence));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_strict_interior_of_box_is_inside(
                min_x in -170.0..170.0_f64,
                min_y in -80.0..80.0_f64,
                w in 0.001..5.0_f64,
                h in 0.001..5.0_f64,
                fx in 0.01..0.99_f64,
                fy in 0.01..0.99_f64,
            ) {
                let poly = Polygon::from_lng_lat(&[
                    [min_x, min_y],
                    [min_x, min_y + h],
                    [min_x + w, min_y + h],
                    [min_x + w, min_y],
                ]);
                let p = pt(min_x + w * fx, min_y + h * fy);
                prop_assert!(contains(&p, &poly));
            }

            #[test]
            fn test_strict_exterior_of_box_is_outside(
                min_x in -170.0..170.0_f64,
                min_y in -80.0..80.0_f64,
                w in 0.001..5.0_f64,
                h in 0.001..5.0_f64,
                dx in 0.001..10.0_f64,
                fy in 0.0..1.0_f64,
            ) {
                let poly = Polygon::from_lng_lat(&[
                    [min_x, min_y],
                    [min_x, min_y + h],
                    [min_x + w, min_y + h],
                    [min_x + w, min_y],
                ]);
                let right = pt(min_x + w + dx, min_y + h * fy);
                let left = pt(min_x - dx, min_y + h * fy);
                prop_assert!(!contains(&right, &poly));
                prop_assert!(!contains(&left, &poly));
            }

            #[test]
            fn test_rotation_invariance(
                ring in prop::collection::vec((-50.0..50.0_f64, -50.0..50.0_f64), 3..12),
                x in -60.0..60.0_f64,
                y in -60.0..60.0_f64,
                shift in 0usize..12,
            ) {
                let poly: Polygon = ring.iter().map(|&(lng, lat)| Coordinate::new(lat, lng)).collect();
                let p = pt(x, y);
                prop_assert_eq!(contains(&p, &poly), contains(&p, &poly.rotated(shift)));
            }

            #[test]
            fn test_repeatable(
                ring in prop::collection::vec((-50.0..50.0_f64, -50.0..50.0_f64), 0..12),
                x in -60.0..60.0_f64,
                y in -60.0..60.0_f64,
            ) {
                let poly: Polygon = ring.iter().map(|&(lng, lat)| Coordinate::new(lat, lng)).collect();
                let p = pt(x, y);
                prop_assert_eq!(contains(&p, &poly), contains(&p, &poly));
            }
        }
    }
}
