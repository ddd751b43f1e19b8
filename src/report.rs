use serde::Serialize;
use tracing::debug;

use crate::connection::can_connect;
use crate::flow::validate_track_flow;
use crate::geometry::{angle_between, connection_points, opposition_error};
use crate::placement::{CONNECTION_PROXIMITY, has_valid_geometry, straight_end_in_place};
use crate::types::{ConnectionPoint, Family, Piece, PieceKind};

/// Exit points of an open Y/T layout spread further apart than this.
pub const MAX_Y_SHAPE_SPREAD: f64 = 6.0;
/// How close to horizontal the straight of a Y/T layout must be (15°).
pub const HORIZONTAL_TOLERANCE: f64 = std::f64::consts::PI / 12.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl LayoutReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Checks every intended join in a layout, plus the per-piece and
/// whole-layout rules. Never fails; problems come back as messages.
pub fn validate_layout(pieces: &[Piece]) -> LayoutReport {
    let mut errors = Vec::new();
    let points: Vec<Vec<ConnectionPoint>> = pieces.iter().map(connection_points).collect();

    for i in 0..pieces.len() {
        for j in (i + 1)..pieces.len() {
            for a in &points[i] {
                for b in &points[j] {
                    if a.distance_to(b) > CONNECTION_PROXIMITY {
                        continue;
                    }
                    if let Some(reasons) = join_problems(&pieces[i], &pieces[j], a, b) {
                        errors.push(format!(
                            "pieces {i} ({}) and {j} ({}) meet at ({:.2}, {:.2}) but {reasons}",
                            pieces[i], pieces[j], a.x, a.y
                        ));
                    }
                }
            }
        }
    }

    for (i, piece) in pieces.iter().enumerate() {
        if piece.family() != Family::Straight {
            continue;
        }
        for p in &points[i] {
            if !straight_end_in_place(piece, p) {
                let reach = (p.x - piece.x).hypot(p.y - piece.y);
                errors.push(format!(
                    "straight {i} at ({:.2}, {:.2}) has an end at ({:.2}, {:.2}), {reach:.2} from its centre",
                    piece.x, piece.y, p.x, p.y
                ));
            }
        }
    }

    if let Some(error) = open_y_shape(pieces) {
        errors.push(error);
    }

    debug!(pieces = pieces.len(), errors = errors.len(), "layout validated");
    LayoutReport::from_errors(errors)
}

fn join_problems(
    piece1: &Piece,
    piece2: &Piece,
    a: &ConnectionPoint,
    b: &ConnectionPoint,
) -> Option<String> {
    let mut reasons = Vec::new();
    if !can_connect(a, b) {
        reasons.push(format!(
            "the ends do not face each other ({:.1}° off)",
            opposition_error(a.angle, b.angle).to_degrees()
        ));
    }
    if !validate_track_flow(piece1, piece2, a, b) {
        reasons.push("the track does not flow through the join".to_string());
    }
    if !has_valid_geometry(piece1, piece2, a, b) {
        reasons.push(format!(
            "the geometry is off (gap {:.3})",
            a.distance_to(b)
        ));
    }
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}

/// One straight with a curve on each end, curving away in opposite
/// directions. Only this exact three-piece shape is checked.
fn open_y_shape(pieces: &[Piece]) -> Option<String> {
    if pieces.len() != 3 {
        return None;
    }
    let straights: Vec<&Piece> = pieces
        .iter()
        .filter(|p| p.kind == PieceKind::Straight)
        .collect();
    let curves: Vec<&Piece> = pieces
        .iter()
        .filter(|p| matches!(p.kind, PieceKind::Curve { .. }))
        .collect();
    let ([straight], [c1, c2]) = (straights.as_slice(), curves.as_slice()) else {
        return None;
    };

    let horizontal = angle_between(straight.rotation, 0.0) <= HORIZONTAL_TOLERANCE
        || angle_between(straight.rotation, std::f64::consts::PI) <= HORIZONTAL_TOLERANCE;
    if !horizontal {
        return None;
    }
    if opposition_error(c1.rotation, c2.rotation) > HORIZONTAL_TOLERANCE {
        return None;
    }

    let ends = connection_points(straight);
    let at_an_end = |curve: &Piece| {
        connection_points(curve)
            .iter()
            .any(|p| ends.iter().any(|e| p.distance_to(e) <= CONNECTION_PROXIMITY))
    };
    if !at_an_end(*c1) || !at_an_end(*c2) {
        return None;
    }

    let exit1 = connection_points(c1)[1];
    let exit2 = connection_points(c2)[1];
    let spread = exit1.distance_to(&exit2);
    if spread > MAX_Y_SHAPE_SPREAD {
        return Some(format!(
            "open Y/T shape: curve exits at ({:.2}, {:.2}) and ({:.2}, {:.2}) diverge by {spread:.2} grid units",
            exit1.x, exit1.y, exit2.x, exit2.y
        ));
    }
    None
}
