use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;

use crate::geometry::{normalize_signed, opposition_error};
use crate::placement::is_valid_connection_types;
use crate::types::{ConnectionPoint, Family, Piece};

/// Distance and angle slack for deciding that two points join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub distance: f64,
    pub angle: f64,
}

impl Tolerance {
    /// "Did the user probably mean to connect these": 0.3 units, 30°.
    pub const PERMISSIVE: Tolerance = Tolerance {
        distance: 0.3,
        angle: PI / 6.0,
    };
    /// Used while searching for a snap: 0.3 units, 15°.
    pub const SNAP: Tolerance = Tolerance {
        distance: 0.3,
        angle: PI / 12.0,
    };
    /// Committed layouts: 0.05 units, 7.5°.
    pub const STRICT: Tolerance = Tolerance {
        distance: 0.05,
        angle: PI / 24.0,
    };
}

/// Residual allowed after snapping a rotation to its increment.
pub const ROTATION_ALIGN_TOLERANCE: f64 = PI / 24.0;

pub fn can_connect(p1: &ConnectionPoint, p2: &ConnectionPoint) -> bool {
    can_connect_within(p1, p2, Tolerance::PERMISSIVE)
}

pub fn can_connect_within(p1: &ConnectionPoint, p2: &ConnectionPoint, tolerance: Tolerance) -> bool {
    p1.distance_to(p2) <= tolerance.distance && opposition_error(p1.angle, p2.angle) <= tolerance.angle
}

pub fn rotation_increment(family: Family) -> f64 {
    match family {
        Family::Straight => FRAC_PI_2,
        Family::Curve => PI / 8.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationFit {
    pub can_connect: bool,
    /// Rotation to add to `piece1`, already snapped to its increment.
    pub rotation_needed: f64,
}

/// Whether `p1` on `piece1` can be turned onto `p2` on `piece2` by a whole
/// number of rotation increments.
pub fn can_connect_with_rotation(
    piece1: &Piece,
    piece2: &Piece,
    p1: &ConnectionPoint,
    p2: &ConnectionPoint,
) -> RotationFit {
    let rejected = RotationFit {
        can_connect: false,
        rotation_needed: 0.0,
    };
    if !is_valid_connection_types(piece1, piece2, p1, p2) {
        return rejected;
    }
    if p1.distance_to(p2) > Tolerance::PERMISSIVE.distance {
        return rejected;
    }

    let delta = normalize_signed(p2.angle + PI - p1.angle);
    let step = rotation_increment(piece1.family());
    let snapped = (delta / step).round() * step;
    let residual = opposition_error(p1.angle + snapped, p2.angle);

    RotationFit {
        can_connect: residual <= ROTATION_ALIGN_TOLERANCE,
        rotation_needed: snapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::connection_points;
    use crate::types::Polarity;

    fn point(x: f64, y: f64, angle: f64, polarity: Polarity) -> ConnectionPoint {
        ConnectionPoint {
            x,
            y,
            angle,
            polarity,
        }
    }

    #[test]
    fn test_facing_points_connect() {
        let a = point(2.0, 0.0, -FRAC_PI_2, Polarity::Female);
        let b = point(2.1, 0.1, FRAC_PI_2, Polarity::Male);
        assert!(can_connect(&a, &b));
        assert!(can_connect_within(&a, &b, Tolerance::SNAP));
        assert!(!can_connect_within(&a, &b, Tolerance::STRICT));
    }

    #[test]
    fn test_far_points_do_not_connect() {
        let a = point(0.0, 0.0, 0.0, Polarity::Female);
        let b = point(0.31, 0.0, PI, Polarity::Male);
        assert!(!can_connect(&a, &b));
    }

    #[test]
    fn test_angle_tolerance_bands() {
        let a = point(0.0, 0.0, 0.0, Polarity::Female);
        let b = point(0.0, 0.0, PI + 20f64.to_radians(), Polarity::Male);
        assert!(can_connect(&a, &b));
        assert!(!can_connect_within(&a, &b, Tolerance::SNAP));

        let c = point(0.0, 0.0, PI + 35f64.to_radians(), Polarity::Male);
        assert!(!can_connect(&a, &c));
    }

    #[test]
    fn test_same_facing_does_not_connect() {
        let a = point(0.0, 0.0, 1.0, Polarity::Female);
        let b = point(0.0, 0.0, 1.0, Polarity::Male);
        assert!(!can_connect(&a, &b));
    }

    #[test]
    fn test_rotation_fit_for_curve() {
        let existing = Piece::curve(0.0, 0.0, 0.0, false);
        let target = connection_points(&existing)[1];
        // Entry faces rotation + π; one curve step short of opposing the exit.
        let moving = Piece::curve(target.x + 0.1, target.y, 0.0, false);
        let entry = connection_points(&moving)[0];
        let fit = can_connect_with_rotation(&moving, &existing, &entry, &target);
        assert!(fit.can_connect);
        assert!((fit.rotation_needed - PI / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_fit_straight_uses_quarter_turns() {
        let existing = Piece::straight(0.0, 0.0, 0.0);
        let target = connection_points(&existing)[1];
        let moving = Piece::straight(4.0, 0.0, PI / 8.0);

        // 22.5° off cannot be fixed with 90° steps.
        let skewed = point(target.x, target.y, FRAC_PI_2 + PI / 8.0, Polarity::Male);
        let fit = can_connect_with_rotation(&moving, &existing, &skewed, &target);
        assert!(!fit.can_connect);
        assert!(fit.rotation_needed.abs() < 1e-9);

        let quarter = point(target.x, target.y, PI, Polarity::Male);
        let fit = can_connect_with_rotation(&moving, &existing, &quarter, &target);
        assert!(fit.can_connect);
        assert!((fit.rotation_needed + FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_fit_rejects_same_polarity() {
        let a = Piece::straight(0.0, 0.0, 0.0);
        let b = Piece::straight(4.0, 0.0, 0.0);
        let a_front = connection_points(&a)[1];
        let b_back = connection_points(&b)[0];
        assert!(can_connect_with_rotation(&a, &b, &a_front, &b_back).can_connect);

        let fake = ConnectionPoint {
            polarity: Polarity::Female,
            ..b_back
        };
        assert!(!can_connect_with_rotation(&a, &b, &a_front, &fake).can_connect);
    }
}
