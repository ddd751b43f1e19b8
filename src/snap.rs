use std::f64::consts::{PI, TAU};

use tracing::{debug, trace};

use crate::flow::validate_track_flow;
use crate::geometry::{connection_points, normalize_angle, opposition_error};
use crate::placement::{check_collision, is_reasonable_connection, is_valid_connection_types};
use crate::types::{ConnectionPoint, Family, Piece, Position, SnapResult};

pub const ROTATION_STEPS: usize = 16;
/// Opposition slack while searching (15°).
pub const SNAP_ANGLE_TOLERANCE: f64 = PI / 12.0;
pub const DEFAULT_SNAP_DISTANCE: f64 = 0.8;

/// One way of joining the moving piece onto an existing connection point.
#[derive(Debug, Clone, Copy)]
pub struct SnapCandidate {
    pub piece: Piece,
    pub target: usize,
    pub point: ConnectionPoint,
    pub target_point: ConnectionPoint,
    /// Point-to-point distance before correction.
    pub distance: f64,
}

impl SnapCandidate {
    pub fn to_result(&self) -> SnapResult {
        let flipped = match self.piece.family() {
            Family::Straight => None,
            Family::Curve => Some(self.piece.flipped()),
        };
        SnapResult {
            position: Position {
                x: self.piece.x,
                y: self.piece.y,
            },
            rotation: normalize_angle(self.piece.rotation),
            flipped,
        }
    }
}

pub struct SnapSearch<'a> {
    existing: &'a [Piece],
    targets: Vec<(usize, ConnectionPoint)>,
    snap_distance: f64,
}

impl<'a> SnapSearch<'a> {
    pub fn new(existing: &'a [Piece], snap_distance: f64) -> Self {
        let targets = existing
            .iter()
            .enumerate()
            .flat_map(|(i, piece)| connection_points(piece).into_iter().map(move |p| (i, p)))
            .collect();
        Self {
            existing,
            targets,
            snap_distance,
        }
    }

    /// Best snap for `moving`, or `None` when nothing qualifies.
    pub fn find(&self, moving: &Piece) -> Option<SnapResult> {
        if self.existing.is_empty() {
            return None;
        }

        let best = best_candidate(
            self.candidates(moving)
                .filter(|candidate| self.is_acceptable(candidate)),
        );

        match &best {
            Some(c) => debug!(
                target = c.target,
                distance = c.distance,
                x = c.piece.x,
                y = c.piece.y,
                rotation = c.piece.rotation,
                "snap found"
            ),
            None => debug!(existing = self.existing.len(), "no snap"),
        }
        best.map(|c| c.to_result())
    }

    /// Every flip state and rotation offset the search considers, the
    /// caller's current flip first.
    pub fn variants(moving: &Piece) -> impl Iterator<Item = Piece> + use<> {
        let moving = *moving;
        let step = TAU / ROTATION_STEPS as f64;
        [moving.flipped(), !moving.flipped()]
            .into_iter()
            .flat_map(move |flipped| {
                (0..ROTATION_STEPS).map(move |i| Piece {
                    rotation: moving.rotation + i as f64 * step,
                    kind: moving.kind.with_flipped(flipped),
                    ..moving
                })
            })
    }

    /// Joins that pass the local gates: distance, polarity, opposition and
    /// a small enough correction.
    pub fn candidates(&self, moving: &Piece) -> impl Iterator<Item = SnapCandidate> + '_ {
        Self::variants(moving).flat_map(move |variant| {
            connection_points(&variant)
                .into_iter()
                .flat_map(move |point| {
                    self.targets
                        .iter()
                        .filter_map(move |&(target, target_point)| {
                            self.join(&variant, &point, target, &target_point)
                        })
                })
        })
    }

    fn join(
        &self,
        variant: &Piece,
        point: &ConnectionPoint,
        target: usize,
        target_point: &ConnectionPoint,
    ) -> Option<SnapCandidate> {
        let distance = point.distance_to(target_point);
        if distance > self.snap_distance {
            return None;
        }
        if !is_valid_connection_types(variant, &self.existing[target], point, target_point) {
            trace!(target, "polarity mismatch");
            return None;
        }
        if opposition_error(point.angle, target_point.angle) > SNAP_ANGLE_TOLERANCE {
            return None;
        }
        let dx = target_point.x - point.x;
        let dy = target_point.y - point.y;
        if !is_reasonable_connection(dx, dy) {
            trace!(target, dx, dy, "correction too large");
            return None;
        }
        Some(SnapCandidate {
            piece: Piece {
                x: variant.x + dx,
                y: variant.y + dy,
                ..*variant
            },
            target,
            point: point.translated(dx, dy),
            target_point: *target_point,
            distance,
        })
    }

    pub fn is_acceptable(&self, candidate: &SnapCandidate) -> bool {
        let target = &self.existing[candidate.target];
        if !validate_track_flow(&candidate.piece, target, &candidate.point, &candidate.target_point) {
            trace!(target = candidate.target, "track flow rejected");
            return false;
        }
        if check_collision(&candidate.piece, self.existing) {
            trace!(target = candidate.target, "collision");
            return false;
        }
        true
    }
}

/// Smallest point distance wins; on a tie the earliest candidate is kept.
pub fn best_candidate(candidates: impl Iterator<Item = SnapCandidate>) -> Option<SnapCandidate> {
    candidates.min_by(|a, b| a.distance.total_cmp(&b.distance))
}

pub fn find_snap_position(moving: &Piece, existing: &[Piece], snap_distance: f64) -> Option<SnapResult> {
    SnapSearch::new(existing, snap_distance).find(moving)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Tolerance, can_connect_within};
    use crate::geometry::CURVE_ANGLE_SPAN;
    use proptest::prelude::*;

    /// A snapped pose must put one of its points on an existing point,
    /// facing it.
    fn assert_snap_closes(moving: &Piece, existing: &[Piece], snap: &SnapResult, snap_distance: f64) {
        let placed = snap.apply(moving);
        let closes = connection_points(&placed).iter().any(|p| {
            existing.iter().flat_map(connection_points).any(|q| {
                p.distance_to(&q) <= snap_distance
                    && opposition_error(p.angle, q.angle) <= SNAP_ANGLE_TOLERANCE
            })
        });
        assert!(closes, "snap {snap:?} for {moving} does not close a join");
    }

    #[test]
    fn test_no_existing_pieces() {
        let moving = Piece::straight(3.0, 1.0, 0.0);
        assert!(find_snap_position(&moving, &[], DEFAULT_SNAP_DISTANCE).is_none());
    }

    #[test]
    fn test_variant_count_and_order() {
        let moving = Piece::curve(0.0, 0.0, 0.5, true);
        let variants: Vec<Piece> = SnapSearch::variants(&moving).collect();
        assert_eq!(variants.len(), 2 * ROTATION_STEPS);
        assert_eq!(variants[0], moving);
        assert!(variants[..ROTATION_STEPS].iter().all(|v| v.flipped()));
        assert!(variants[ROTATION_STEPS..].iter().all(|v| !v.flipped()));
        assert!((variants[1].rotation - 0.5 - PI / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_straight_snaps_to_straight_end() {
        let existing = [Piece::straight(0.0, 0.0, 0.0)];
        let moving = Piece::straight(4.3, 0.2, 0.0);
        let snap = find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE).unwrap();
        assert!((snap.position.x - 4.0).abs() < 1e-9);
        assert!(snap.position.y.abs() < 1e-9);
        assert!(snap.rotation.abs() < 1e-9);
        assert_eq!(snap.flipped, None);
        assert_snap_closes(&moving, &existing, &snap, DEFAULT_SNAP_DISTANCE);
    }

    #[test]
    fn test_curve_snaps_onto_curve_exit() {
        let existing = [Piece::curve(0.0, 0.0, 0.0, false)];
        let exit = connection_points(&existing[0])[1];
        let moving = Piece::curve(exit.x + 0.2, exit.y - 0.1, CURVE_ANGLE_SPAN, false);
        let snap = find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE).unwrap();
        assert!((snap.position.x - exit.x).abs() < 1e-9);
        assert!((snap.position.y - exit.y).abs() < 1e-9);
        assert!((snap.rotation - CURVE_ANGLE_SPAN).abs() < 1e-9);
        assert!(snap.flipped.is_some());

        let placed = snap.apply(&moving);
        let joined = connection_points(&placed)
            .iter()
            .any(|p| connection_points(&existing[0]).iter().any(|q| can_connect_within(p, q, Tolerance::STRICT)));
        assert!(joined);
    }

    #[test]
    fn test_far_piece_does_not_snap() {
        let existing = [Piece::straight(0.0, 0.0, 0.0)];
        let moving = Piece::straight(5.0, 0.0, 0.0);
        assert!(find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE).is_none());
    }

    #[test]
    fn test_large_correction_rejected_even_within_snap_distance() {
        let existing = [Piece::straight(0.0, 0.0, 0.0)];
        let moving = Piece::straight(4.7, 0.0, 0.0);
        assert!(find_snap_position(&moving, &existing, 2.0).is_none());
    }

    #[test]
    fn test_snap_blocked_by_collision() {
        let existing = [Piece::straight(0.0, 0.0, 0.0), Piece::straight(5.5, 1.0, 0.0)];
        let moving = Piece::straight(4.3, 0.2, 0.0);
        assert!(find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE).is_none());
    }

    #[test]
    fn test_rotated_variant_found() {
        // Dragged a quarter turn off; the search rotates it back into line.
        let existing = [Piece::straight(0.0, 0.0, 0.0)];
        let moving = Piece::straight(4.2, 0.1, PI);
        let snap = find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE).unwrap();
        assert!((snap.position.x - 4.0).abs() < 1e-9);
        assert!(snap.rotation < 1e-9 || (TAU - snap.rotation) < 1e-9);
    }

    #[test]
    fn test_best_candidate_prefers_smallest_distance() {
        let piece = Piece::straight(0.0, 0.0, 0.0);
        let point = connection_points(&piece)[0];
        let make = |target, distance| SnapCandidate {
            piece,
            target,
            point,
            target_point: point,
            distance,
        };
        let best = best_candidate([make(0, 0.4), make(1, 0.1), make(2, 0.1), make(3, 0.3)].into_iter());
        assert_eq!(best.unwrap().target, 1);
        assert!(best_candidate(std::iter::empty()).is_none());
    }

    #[test]
    fn test_result_rotation_normalized() {
        let existing = [Piece::curve(0.0, 0.0, 0.0, false)];
        let exit = connection_points(&existing[0])[1];
        let moving = Piece::curve(exit.x, exit.y, CURVE_ANGLE_SPAN - TAU, false);
        let snap = find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE).unwrap();
        assert!((0.0..TAU).contains(&snap.rotation));
        assert!((snap.rotation - CURVE_ANGLE_SPAN).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_snap_closes_a_join(dx in -0.6..0.6f64, dy in -0.6..0.6f64, k in 0..16usize, flipped in any::<bool>()) {
            let existing = [
                Piece::straight(0.0, 0.0, 0.0),
                Piece::curve(-2.0, 0.0, std::f64::consts::FRAC_PI_2, false),
            ];
            let moving = Piece::curve(2.0 + dx, dy, k as f64 * PI / 8.0, flipped);
            if let Some(snap) = find_snap_position(&moving, &existing, DEFAULT_SNAP_DISTANCE) {
                assert_snap_closes(&moving, &existing, &snap, DEFAULT_SNAP_DISTANCE);
                prop_assert!(!check_collision(&snap.apply(&moving), &existing));
            }
        }
    }
}
