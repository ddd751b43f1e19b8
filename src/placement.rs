use crate::connection::Tolerance;
use crate::geometry::{STRAIGHT_LENGTH, connection_points, opposition_error};
use crate::types::{ConnectionPoint, Family, Piece};

pub const MIN_STRAIGHT_SPACING: f64 = 3.5;
pub const MIN_CURVE_SPACING: f64 = 1.5;
pub const CONNECTION_PROXIMITY: f64 = 0.1;
pub const MAX_SNAP_ADJUSTMENT: f64 = 0.5;

pub const STRAIGHT_END_TOLERANCE: f64 = 0.1;
pub const STRAIGHT_PAIR_TOLERANCE: f64 = 0.2;

/// Same-family joins must alternate male/female; mixed joins are free.
pub fn is_valid_connection_types(
    piece1: &Piece,
    piece2: &Piece,
    p1: &ConnectionPoint,
    p2: &ConnectionPoint,
) -> bool {
    piece1.family() != piece2.family() || p1.polarity.is_opposite(p2.polarity)
}

/// True when any pair of points from the two pieces sits within
/// `CONNECTION_PROXIMITY`.
pub fn shares_connection(piece1: &Piece, piece2: &Piece) -> bool {
    let points2 = connection_points(piece2);
    connection_points(piece1)
        .iter()
        .any(|a| points2.iter().any(|b| a.distance_to(b) <= CONNECTION_PROXIMITY))
}

pub fn would_overlap(piece1: &Piece, piece2: &Piece) -> bool {
    let min_spacing = if piece1.family() == Family::Straight && piece2.family() == Family::Straight {
        MIN_STRAIGHT_SPACING
    } else {
        MIN_CURVE_SPACING
    };
    if piece1.distance_to(piece2) >= min_spacing {
        return false;
    }
    !shares_connection(piece1, piece2)
}

pub fn check_collision(piece: &Piece, others: &[Piece]) -> bool {
    others.iter().any(|other| would_overlap(piece, other))
}

pub fn is_reasonable_connection(delta_x: f64, delta_y: f64) -> bool {
    delta_x.hypot(delta_y) <= MAX_SNAP_ADJUSTMENT
}

/// Tight geometric check used when importing whole layouts.
pub fn has_valid_geometry(
    piece1: &Piece,
    piece2: &Piece,
    c1: &ConnectionPoint,
    c2: &ConnectionPoint,
) -> bool {
    if c1.distance_to(c2) > Tolerance::STRICT.distance {
        return false;
    }
    if opposition_error(c1.angle, c2.angle) > Tolerance::STRICT.angle {
        return false;
    }
    if !straight_end_in_place(piece1, c1) || !straight_end_in_place(piece2, c2) {
        return false;
    }
    if piece1.family() == Family::Straight && piece2.family() == Family::Straight {
        let spacing = piece1.distance_to(piece2);
        return (spacing - STRAIGHT_LENGTH).abs() <= STRAIGHT_PAIR_TOLERANCE;
    }
    true
}

/// A straight's connection point must sit half a length from its centre.
pub fn straight_end_in_place(piece: &Piece, point: &ConnectionPoint) -> bool {
    if piece.family() != Family::Straight {
        return true;
    }
    let reach = (point.x - piece.x).hypot(point.y - piece.y);
    (reach - STRAIGHT_LENGTH / 2.0).abs() <= STRAIGHT_END_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CURVE_ANGLE_SPAN, align_to};
    use crate::types::{Hand, PieceKind, Polarity};
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_connection_types_same_family() {
        let a = Piece::straight(0.0, 0.0, 0.0);
        let b = Piece::straight(4.0, 0.0, 0.0);
        let pa = connection_points(&a);
        let pb = connection_points(&b);
        assert!(is_valid_connection_types(&a, &b, &pa[1], &pb[0]));
        assert!(!is_valid_connection_types(&a, &b, &pa[1], &pb[1]));
    }

    #[test]
    fn test_connection_types_mixed_family() {
        let s = Piece::straight(0.0, 0.0, 0.0);
        let c = Piece::curve(2.0, 0.0, -FRAC_PI_2, false);
        let ps = connection_points(&s);
        let pc = connection_points(&c);
        for a in &ps {
            for b in &pc {
                assert!(is_valid_connection_types(&s, &c, a, b));
            }
        }
    }

    #[test]
    fn test_switch_counts_as_curve_family() {
        let sw = Piece::switch(Hand::Left, 0.0, 0.0, 0.0, false);
        let c = Piece::curve(0.0, 0.0, 0.0, false);
        let psw = connection_points(&sw);
        let pc = connection_points(&c);
        assert_eq!(psw[0].polarity, Polarity::Male);
        assert!(!is_valid_connection_types(&sw, &c, &psw[0], &pc[0]));
    }

    #[test]
    fn test_straights_too_close_overlap() {
        let a = Piece::straight(0.0, 0.0, 0.0);
        let b = Piece::straight(0.0, 3.0, 0.0);
        assert!(would_overlap(&a, &b));
        let c = Piece::straight(0.0, 3.6, 0.0);
        assert!(!would_overlap(&a, &c));
    }

    #[test]
    fn test_curve_spacing_is_smaller() {
        let a = Piece::straight(0.0, 0.0, 0.0);
        let b = Piece::curve(0.0, 2.0, 0.0, false);
        assert!(!would_overlap(&a, &b));
        let c = Piece::curve(0.0, 1.0, 0.0, false);
        assert!(would_overlap(&a, &c));
    }

    #[test]
    fn test_touching_ends_never_overlap() {
        // Centres 2.83 apart, under the straight spacing, but the ends meet.
        let a = Piece::straight(0.0, 0.0, 0.0);
        let b = Piece::straight(2.0, 2.0, FRAC_PI_2);
        assert!(shares_connection(&a, &b));
        assert!(!would_overlap(&a, &b));

        // Same centre with no shared end.
        let c = Piece::straight(0.0, 0.0, FRAC_PI_2);
        assert!(would_overlap(&a, &c));
    }

    #[test]
    fn test_check_collision() {
        let others = [Piece::straight(0.0, 0.0, 0.0), Piece::straight(10.0, 0.0, 0.0)];
        assert!(check_collision(&Piece::straight(9.0, 1.0, 0.0), &others));
        assert!(!check_collision(&Piece::straight(4.0, 0.0, 0.0), &others));
        assert!(!check_collision(&Piece::straight(4.0, 0.0, 0.0), &[]));
    }

    #[test]
    fn test_reasonable_connection() {
        assert!(is_reasonable_connection(0.3, 0.3));
        assert!(!is_reasonable_connection(0.4, 0.4));
    }

    #[test]
    fn test_geometry_straight_pair() {
        let a = Piece::straight(0.0, 0.0, 0.0);
        let b = Piece::straight(4.0, 0.0, 0.0);
        let pa = connection_points(&a);
        let pb = connection_points(&b);
        assert!(has_valid_geometry(&a, &b, &pa[1], &pb[0]));

        let gap = Piece::straight(4.04, 0.0, 0.0);
        let pg = connection_points(&gap);
        assert!(has_valid_geometry(&a, &gap, &pa[1], &pg[0]));

        let far = Piece::straight(4.1, 0.0, 0.0);
        let pf = connection_points(&far);
        assert!(!has_valid_geometry(&a, &far, &pa[1], &pf[0]));
    }

    #[test]
    fn test_geometry_rejects_skewed_angle() {
        let a = Piece::curve(0.0, 0.0, 0.0, false);
        let exit = connection_points(&a)[1];
        let b = Piece::curve(exit.x, exit.y, CURVE_ANGLE_SPAN + 0.2, false);
        let entry = connection_points(&b)[0];
        assert!(!has_valid_geometry(&a, &b, &exit, &entry));

        let b = Piece::curve(exit.x, exit.y, CURVE_ANGLE_SPAN, false);
        let entry = connection_points(&b)[0];
        assert!(has_valid_geometry(&a, &b, &exit, &entry));
    }

    #[test]
    fn test_straight_end_in_place() {
        let s = Piece::straight(0.0, 0.0, 0.0);
        let p = connection_points(&s)[0];
        assert!(straight_end_in_place(&s, &p));
        let moved = ConnectionPoint { x: -2.5, ..p };
        assert!(!straight_end_in_place(&s, &moved));
        assert!(straight_end_in_place(&Piece::curve(0.0, 0.0, 0.0, false), &moved));
    }

    proptest! {
        #[test]
        fn prop_joined_pieces_never_overlap(
            x in -20.0..20.0f64,
            y in -20.0..20.0f64,
            rotation in -7.0..7.0f64,
            anchor_is_curve in any::<bool>(),
            joiner_is_curve in any::<bool>(),
            point in 0..2usize,
            index in 0..2usize,
        ) {
            let anchor = if anchor_is_curve {
                Piece::curve(x, y, rotation, false)
            } else {
                Piece::straight(x, y, rotation)
            };
            let kind = if joiner_is_curve {
                PieceKind::Curve { flipped: true }
            } else {
                PieceKind::Straight
            };
            let target = connection_points(&anchor)[point];
            let joiner = align_to(kind, index, &target).unwrap();
            prop_assert!(shares_connection(&anchor, &joiner));
            prop_assert!(!would_overlap(&anchor, &joiner));
        }
    }
}
