use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::geometry::{angle_between, normalize_angle, opposition_error};
use crate::types::{ConnectionPoint, Family, Piece};

/// Two straights count as parallel within 15°.
pub const PARALLEL_TOLERANCE: f64 = PI / 12.0;
/// Joins touching a curve must oppose within 7.5°.
pub const FLOW_ANGLE_TOLERANCE: f64 = PI / 24.0;
pub const COMPASS_TOLERANCE: f64 = PI / 6.0;
/// Allowed distance of a straight-curve relative rotation from a multiple
/// of 45°.
pub const CANONICAL_ROTATION_TOLERANCE: f64 = PI / 8.0;

// Absorbs rounding on rotations that sit exactly on a tolerance edge.
const EDGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    NorthSouth,
    EastWest,
    Oblique,
}

pub fn compass_bucket(angle: f64) -> Compass {
    let a = normalize_angle(angle);
    let near = |axis: f64| angle_between(a, axis) <= COMPASS_TOLERANCE;
    if near(0.0) || near(PI) {
        Compass::EastWest
    } else if near(FRAC_PI_2) || near(3.0 * FRAC_PI_2) {
        Compass::NorthSouth
    } else {
        Compass::Oblique
    }
}

/// Semantic check that a join between two pieces makes sense as track,
/// not just that the points touch.
pub fn validate_track_flow(
    piece1: &Piece,
    piece2: &Piece,
    conn1: &ConnectionPoint,
    conn2: &ConnectionPoint,
) -> bool {
    match (piece1.family(), piece2.family()) {
        (Family::Straight, Family::Straight) => {
            let diff = angle_between(piece1.rotation, piece2.rotation);
            diff < PARALLEL_TOLERANCE || PI - diff < PARALLEL_TOLERANCE
        }
        (Family::Straight, Family::Curve) => straight_meets_curve(piece1, piece2, conn1, conn2),
        (Family::Curve, Family::Straight) => straight_meets_curve(piece2, piece1, conn2, conn1),
        (Family::Curve, Family::Curve) => {
            opposition_error(conn1.angle, conn2.angle) <= FLOW_ANGLE_TOLERANCE + EDGE_EPSILON
        }
    }
}

fn straight_meets_curve(
    straight: &Piece,
    curve: &Piece,
    straight_conn: &ConnectionPoint,
    curve_conn: &ConnectionPoint,
) -> bool {
    if opposition_error(straight_conn.angle, curve_conn.angle) > FLOW_ANGLE_TOLERANCE + EDGE_EPSILON {
        return false;
    }

    match (compass_bucket(straight_conn.angle), compass_bucket(curve_conn.angle)) {
        (Compass::NorthSouth, Compass::EastWest) | (Compass::EastWest, Compass::NorthSouth) => {
            return false;
        }
        _ => {}
    }

    let relative = normalize_angle(straight.rotation - curve.rotation);
    let nearest = (relative / FRAC_PI_4).round() * FRAC_PI_4;
    (relative - nearest).abs() <= CANONICAL_ROTATION_TOLERANCE + EDGE_EPSILON
}
