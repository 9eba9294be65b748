//! Spherical polygon area and containment on the unit sphere.
//!
//! Rings are lon/lat degrees with great-circle edges. A clockwise ring encloses the small
//! region on its right; the same ring wound anticlockwise encloses the rest of the sphere.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use crate::geometry::{Feature, Position, Ring};

const EPSILON: f64 = 1e-6;
const EPSILON2: f64 = 1e-12;

/// Ring vertices in radians without the duplicated closing vertex.
fn open_ring(ring: &Ring) -> impl Iterator<Item = (f64, f64)> + '_ {
    let closed = ring.len() > 1 && ring.first() == ring.last();
    let len = if closed { ring.len() - 1 } else { ring.len() };
    ring[..len]
        .iter()
        .map(|p| (p.lon.to_radians(), p.lat.to_radians()))
}

fn longitude(lambda: f64) -> f64 {
    if lambda.abs() <= PI {
        lambda
    } else {
        lambda.signum() * ((lambda.abs() + PI) % TAU - PI)
    }
}

fn cartesian(lambda: f64, phi: f64) -> [f64; 3] {
    let cos_phi = phi.cos();
    [cos_phi * lambda.cos(), cos_phi * lambda.sin(), phi.sin()]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        return v;
    }
    v.map(|c| c / len)
}

/// Signed contribution of the edge between two vertices to the polygon's spherical excess.
/// Latitudes are pre-shifted to `phi / 2 + π/4`.
fn edge_excess(lambda0: f64, half0: f64, lambda1: f64, half1: f64) -> f64 {
    let delta = lambda1 - lambda0;
    let sign = if delta >= 0.0 { 1.0 } else { -1.0 };
    let abs_delta = sign * delta;
    let k = half0.sin() * half1.sin();
    (k * sign * abs_delta.sin()).atan2(half0.cos() * half1.cos() + k * abs_delta.cos())
}

/// Area in steradians of one polygon (exterior ring plus holes).
pub fn polygon_area(rings: &[Ring]) -> f64 {
    let sum: f64 = rings
        .iter()
        .map(|ring| {
            let points: Vec<(f64, f64)> = open_ring(ring).collect();
            let Some(&last) = points.last() else {
                return 0.0;
            };
            let mut previous = last;
            points
                .iter()
                .map(|&current| {
                    let excess = edge_excess(
                        previous.0,
                        previous.1 / 2.0 + FRAC_PI_4,
                        current.0,
                        current.1 / 2.0 + FRAC_PI_4,
                    );
                    previous = current;
                    excess
                })
                .sum::<f64>()
        })
        .sum();
    2.0 * if sum < 0.0 { TAU + sum } else { sum }
}

/// Total area in steradians across every polygon of the feature.
pub fn feature_area(feature: &Feature) -> f64 {
    feature
        .polygons()
        .iter()
        .map(|rings| polygon_area(rings))
        .sum()
}

/// Winding-number containment of `point` (lon/lat degrees) in one polygon.
pub fn polygon_contains(rings: &[Ring], point: Position) -> bool {
    let lambda = longitude(point.lon.to_radians());
    let mut phi = point.lat.to_radians();
    let sin_phi = phi.sin();
    if sin_phi == 1.0 {
        phi = FRAC_PI_2 + EPSILON;
    } else if sin_phi == -1.0 {
        phi = -FRAC_PI_2 - EPSILON;
    }
    let normal = [lambda.sin(), -lambda.cos(), 0.0];

    let mut angle = 0.0;
    let mut sum = 0.0;
    let mut winding: i32 = 0;

    for ring in rings {
        let points: Vec<(f64, f64)> = open_ring(ring).collect();
        let Some(&(mut lambda0_raw, mut phi0_raw)) = points.last() else {
            continue;
        };
        for &(lambda1_raw, phi1_raw) in &points {
            let lambda0 = longitude(lambda0_raw);
            let lambda1 = longitude(lambda1_raw);
            let delta = lambda1 - lambda0;
            let sign = if delta >= 0.0 { 1.0 } else { -1.0 };
            let antimeridian = sign * delta > PI;

            sum += edge_excess(
                lambda0,
                phi0_raw / 2.0 + FRAC_PI_4,
                lambda1,
                phi1_raw / 2.0 + FRAC_PI_4,
            );
            angle += if antimeridian { delta + sign * TAU } else { delta };

            // Edge straddles the point's meridian: find where the arc crosses it.
            if antimeridian ^ (lambda0 >= lambda) ^ (lambda1 >= lambda) {
                let arc = normalize(cross(
                    cartesian(lambda0_raw, phi0_raw),
                    cartesian(lambda1_raw, phi1_raw),
                ));
                let intersection = normalize(cross(normal, arc));
                let flipped = antimeridian ^ (delta >= 0.0);
                let sign = if flipped { -1.0 } else { 1.0 };
                let phi_arc = sign * intersection[2].clamp(-1.0, 1.0).asin();
                if phi > phi_arc || (phi == phi_arc && (arc[0] != 0.0 || arc[1] != 0.0)) {
                    winding += if flipped { 1 } else { -1 };
                }
            }

            lambda0_raw = lambda1_raw;
            phi0_raw = phi1_raw;
        }
    }

    (angle < -EPSILON || (angle < EPSILON && sum < -EPSILON2)) ^ (winding & 1 == 1)
}

pub fn feature_contains(feature: &Feature, point: Position) -> bool {
    feature
        .polygons()
        .iter()
        .any(|rings| polygon_contains(rings, point))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::geometry::fixtures::square_at;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < tolerance,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn ring(points: &[[f64; 2]]) -> Ring {
        points.iter().copied().map(Position::from).collect()
    }

    #[test]
    fn clockwise_box_has_small_area() {
        let feature = square_at("a", 10.0, 0.0, 5.0);
        // Lat/lon box area is Δλ·(sin φ1 − sin φ0); great-circle edges bulge slightly outward.
        let expected = 10f64.to_radians() * (2.0 * 5f64.to_radians().sin());
        assert_close(feature_area(&feature), expected, 2e-4);
    }

    #[test]
    fn anticlockwise_box_covers_the_rest_of_the_sphere() {
        let cw = ring(&[[5.0, -5.0], [5.0, 5.0], [15.0, 5.0], [15.0, -5.0], [5.0, -5.0]]);
        let ccw: Ring = cw.iter().rev().copied().collect();
        let small = polygon_area(&[cw]);
        let large = polygon_area(&[ccw]);
        assert!(large > 2.0 * PI);
        assert_close(small + large, 4.0 * PI, 1e-9);
    }

    #[test]
    fn contains_inside_and_not_outside() {
        let feature = square_at("a", 10.0, 0.0, 5.0);
        assert!(feature_contains(&feature, Position::new(10.0, 0.0)));
        assert!(feature_contains(&feature, Position::new(14.0, 4.0)));
        assert!(!feature_contains(&feature, Position::new(20.0, 0.0)));
        assert!(!feature_contains(&feature, Position::new(10.0, 8.0)));
        assert!(!feature_contains(&feature, Position::new(-170.0, 0.0)));
    }

    #[test]
    fn hole_is_excluded() {
        let outer = ring(&[[0.0, 0.0], [0.0, 20.0], [20.0, 20.0], [20.0, 0.0], [0.0, 0.0]]);
        let hole = ring(&[[5.0, 5.0], [15.0, 5.0], [15.0, 15.0], [5.0, 15.0], [5.0, 5.0]]);
        let rings = vec![outer, hole];
        assert!(polygon_contains(&rings, Position::new(2.0, 10.0)));
        assert!(!polygon_contains(&rings, Position::new(10.0, 10.0)));
        assert!(polygon_area(&rings) < polygon_area(&rings[..1]));
    }

    #[test]
    fn ring_across_antimeridian() {
        let rings = vec![ring(&[
            [170.0, -5.0],
            [170.0, 5.0],
            [-170.0, 5.0],
            [-170.0, -5.0],
            [170.0, -5.0],
        ])];
        assert!(polygon_contains(&rings, Position::new(180.0, 0.0)));
        assert!(polygon_contains(&rings, Position::new(-175.0, 1.0)));
        assert!(!polygon_contains(&rings, Position::new(0.0, 0.0)));
        assert!(polygon_area(&rings) < 0.1);
    }

    #[test]
    fn empty_rings_contain_nothing() {
        assert!(!polygon_contains(&[], Position::new(0.0, 0.0)));
        assert!(!polygon_contains(&[Vec::new()], Position::new(0.0, 0.0)));
        assert_eq!(polygon_area(&[]), 0.0);
    }
}
