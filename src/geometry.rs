use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::types::{ConnectionPoint, Hand, Piece, PieceKind, Polarity};

/// Straight length in grid units (128px at 32px per unit).
pub const STRAIGHT_LENGTH: f64 = 4.0;
pub const CURVE_RADIUS: f64 = 10.0;
/// Sweep of one curve piece; sixteen make a full circle.
pub const CURVE_ANGLE_SPAN: f64 = PI / 8.0;
pub const SWITCH_LENGTH: f64 = STRAIGHT_LENGTH;

pub const TRACK_HALF_WIDTH: f64 = 0.5;
pub const CURVE_HIT_INNER_RADIUS: f64 = 9.375;
pub const CURVE_HIT_OUTER_RADIUS: f64 = 10.625;

/// Maps any angle onto `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let r = angle.rem_euclid(TAU);
    if r >= TAU { 0.0 } else { r }
}

/// Maps any angle onto `(-π, π]`.
pub fn normalize_signed(angle: f64) -> f64 {
    let r = normalize_angle(angle);
    if r > PI { r - TAU } else { r }
}

/// Unsigned smallest difference between two directions, in `[0, π]`.
pub fn angle_between(a: f64, b: f64) -> f64 {
    normalize_signed(a - b).abs()
}

/// How far two facings are from pointing exactly at each other.
pub fn opposition_error(a: f64, b: f64) -> f64 {
    normalize_signed(a - b - PI).abs()
}

fn rotate(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// World-space connection points of a piece, in a fixed order per kind:
/// straight (back, front), curve (entry, exit), switch (entry, through,
/// diverging).
pub fn connection_points(piece: &Piece) -> Vec<ConnectionPoint> {
    match piece.kind {
        PieceKind::Straight => straight_points(piece).to_vec(),
        PieceKind::Curve { flipped } => {
            let sweep = if flipped {
                -CURVE_ANGLE_SPAN
            } else {
                CURVE_ANGLE_SPAN
            };
            vec![entry_point(piece), arc_exit(piece, sweep)]
        }
        PieceKind::Switch { hand, flipped } => {
            let side = switch_side(hand, flipped);
            vec![
                entry_point(piece),
                through_exit(piece, side),
                arc_exit(piece, side * CURVE_ANGLE_SPAN),
            ]
        }
    }
}

fn straight_points(piece: &Piece) -> [ConnectionPoint; 2] {
    let half = STRAIGHT_LENGTH / 2.0;
    let (sin, cos) = piece.rotation.sin_cos();
    // Angles run across the track, not along it; the curve entry uses the
    // same convention so straight-curve joins oppose exactly.
    [
        ConnectionPoint {
            x: piece.x - half * cos,
            y: piece.y - half * sin,
            angle: piece.rotation + FRAC_PI_2,
            polarity: Polarity::Male,
        },
        ConnectionPoint {
            x: piece.x + half * cos,
            y: piece.y + half * sin,
            angle: piece.rotation - FRAC_PI_2,
            polarity: Polarity::Female,
        },
    ]
}

fn entry_point(piece: &Piece) -> ConnectionPoint {
    ConnectionPoint {
        x: piece.x,
        y: piece.y,
        angle: piece.rotation + PI,
        polarity: Polarity::Male,
    }
}

/// Centre of the arc a curve or switch bends around.
pub fn arc_center(piece: &Piece) -> (f64, f64) {
    let (sin, cos) = piece.rotation.sin_cos();
    (piece.x - CURVE_RADIUS * cos, piece.y - CURVE_RADIUS * sin)
}

fn arc_exit(piece: &Piece, sweep: f64) -> ConnectionPoint {
    let (cx, cy) = arc_center(piece);
    let angle = piece.rotation + sweep;
    ConnectionPoint {
        x: cx + CURVE_RADIUS * angle.cos(),
        y: cy + CURVE_RADIUS * angle.sin(),
        angle,
        polarity: Polarity::Female,
    }
}

fn through_exit(piece: &Piece, side: f64) -> ConnectionPoint {
    let (sin, cos) = piece.rotation.sin_cos();
    ConnectionPoint {
        x: piece.x - SWITCH_LENGTH * side * sin,
        y: piece.y + SWITCH_LENGTH * side * cos,
        angle: piece.rotation,
        polarity: Polarity::Female,
    }
}

fn switch_side(hand: Hand, flipped: bool) -> f64 {
    let side = match hand {
        Hand::Left => 1.0,
        Hand::Right => -1.0,
    };
    if flipped { -side } else { side }
}

pub fn connection_indicators(pieces: &[Piece]) -> Vec<ConnectionPoint> {
    pieces.iter().flat_map(connection_points).collect()
}

/// Whether the grid point `(x, y)` lies on the piece's track bed.
pub fn contains_point(piece: &Piece, x: f64, y: f64) -> bool {
    let (lx, ly) = rotate(x - piece.x, y - piece.y, -piece.rotation);
    match piece.kind {
        PieceKind::Straight => {
            lx.abs() < STRAIGHT_LENGTH / 2.0 && ly.abs() < TRACK_HALF_WIDTH
        }
        PieceKind::Curve { flipped } => {
            let sweep = if flipped {
                -CURVE_ANGLE_SPAN
            } else {
                CURVE_ANGLE_SPAN
            };
            on_arc(lx, ly, sweep)
        }
        PieceKind::Switch { hand, flipped } => {
            let side = switch_side(hand, flipped);
            let along = ly * side;
            let on_leg = lx.abs() < TRACK_HALF_WIDTH && (0.0..=SWITCH_LENGTH).contains(&along);
            on_leg || on_arc(lx, ly, side * CURVE_ANGLE_SPAN)
        }
    }
}

fn on_arc(lx: f64, ly: f64, sweep: f64) -> bool {
    let ox = lx + CURVE_RADIUS;
    let dist = ox.hypot(ly);
    if !(CURVE_HIT_INNER_RADIUS..=CURVE_HIT_OUTER_RADIUS).contains(&dist) {
        return false;
    }
    let angle = ly.atan2(ox);
    if sweep >= 0.0 {
        (0.0..=sweep).contains(&angle)
    } else {
        (sweep..=0.0).contains(&angle)
    }
}

pub fn piece_at(pieces: &[Piece], x: f64, y: f64) -> Option<usize> {
    pieces.iter().position(|p| contains_point(p, x, y))
}

/// The pose at which a piece of `kind` has its `point_index` connection
/// point sitting on `target` and facing it exactly.
pub fn align_to(kind: PieceKind, point_index: usize, target: &ConnectionPoint) -> Option<Piece> {
    let local = connection_points(&Piece::new(kind, 0.0, 0.0, 0.0));
    let point = local.get(point_index)?;
    let rotation = normalize_angle(target.angle + PI - point.angle);
    let (ox, oy) = rotate(point.x, point.y, rotation);
    Some(Piece::new(kind, target.x - ox, target.y - oy, rotation))
}
