use tracing::debug;

use crate::geometry::{CURVE_ANGLE_SPAN, CURVE_RADIUS, align_to, connection_points, normalize_angle};
use crate::placement::{check_collision, is_valid_connection_types};
use crate::topology::open_ends;
use crate::types::{Piece, PieceKind};

const CIRCLE_CURVES: usize = 16;
const OVAL_STRAIGHTS: usize = 8;

const SCATTER_PITCH_X: f64 = 6.0;
const SCATTER_PITCH_Y: f64 = 4.0;
const SCATTER_WRAP_X: f64 = 20.0;

const SIDE_ORIGIN_X: f64 = 15.0;
const SIDE_PITCH_X: f64 = 6.0;
const SIDE_PITCH_Y: f64 = 3.0;
const SIDE_WRAP_Y: f64 = 10.0;

/// Layout strategies in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    PerfectCircle,
    OvalLoop,
    ConnectedLoop,
    LinearChain,
    Scattered,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 5] = [
        LayoutStrategy::PerfectCircle,
        LayoutStrategy::OvalLoop,
        LayoutStrategy::ConnectedLoop,
        LayoutStrategy::LinearChain,
        LayoutStrategy::Scattered,
    ];

    pub fn can_build(self, straights: usize, curves: usize) -> bool {
        match self {
            LayoutStrategy::PerfectCircle => curves == CIRCLE_CURVES && straights == 0,
            LayoutStrategy::OvalLoop => curves == CIRCLE_CURVES && straights == OVAL_STRAIGHTS,
            LayoutStrategy::ConnectedLoop => curves >= 4 && straights.saturating_add(curves) >= 6,
            LayoutStrategy::LinearChain => straights.saturating_add(curves) >= 2,
            LayoutStrategy::Scattered => true,
        }
    }

    /// Falls back to a scattered grid when the inventory does not suit
    /// this strategy.
    pub fn build(self, straights: usize, curves: usize) -> Vec<Piece> {
        if !self.can_build(straights, curves) {
            return scattered(straights, curves);
        }
        match self {
            LayoutStrategy::PerfectCircle => perfect_circle(),
            LayoutStrategy::OvalLoop => oval_loop(),
            LayoutStrategy::ConnectedLoop => connected_loop(straights, curves),
            LayoutStrategy::LinearChain => linear_chain(straights, curves),
            LayoutStrategy::Scattered => scattered(straights, curves),
        }
    }

    pub fn choose(straights: usize, curves: usize) -> LayoutStrategy {
        Self::ALL
            .into_iter()
            .find(|s| s.can_build(straights, curves))
            .unwrap_or(LayoutStrategy::Scattered)
    }
}

/// Builds a starting layout from a piece inventory. The result always holds
/// exactly `straights + curves` pieces.
pub fn generate_auto_layout(straights: usize, curves: usize) -> Vec<Piece> {
    let strategy = LayoutStrategy::choose(straights, curves);
    debug!(straights, curves, ?strategy, "generating layout");
    strategy.build(straights, curves)
}

/// Curve `step` of a ring of sixteen around `(cx, cy)`.
fn ring_curve(cx: f64, cy: f64, step: i32) -> Piece {
    let angle = f64::from(step) * CURVE_ANGLE_SPAN;
    Piece::curve(
        cx + CURVE_RADIUS * angle.cos(),
        cy + CURVE_RADIUS * angle.sin(),
        normalize_angle(angle),
        false,
    )
}

fn perfect_circle() -> Vec<Piece> {
    (0..CIRCLE_CURVES as i32)
        .map(|step| ring_curve(0.0, 0.0, step))
        .collect()
}

/// Two half circles joined by four straights along the top and four along
/// the bottom, centred on the origin.
fn oval_loop() -> Vec<Piece> {
    let (right, left) = (3.0, -13.0);
    let mut pieces: Vec<Piece> = (-4..4).map(|step| ring_curve(right, -6.0, step)).collect();
    pieces.extend((4..12).map(|step| ring_curve(left, -6.0, step)));
    for x in [1.0, -3.0, -7.0, -11.0] {
        pieces.push(Piece::straight(x, 4.0, 0.0));
        pieces.push(Piece::straight(x, -16.0, 0.0));
    }

    let (min_x, max_x, min_y, max_y) = pieces.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(a, b, c, d), p| (a.min(p.x), b.max(p.x), c.min(p.y), d.max(p.y)),
    );
    let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    for piece in &mut pieces {
        piece.x -= cx;
        piece.y -= cy;
    }
    pieces
}

fn connected_loop(straights: usize, curves: usize) -> Vec<Piece> {
    let mut remaining_straights = straights;
    let mut remaining_curves = curves;
    let first = if remaining_curves > 0 {
        remaining_curves -= 1;
        Piece::curve(0.0, 0.0, 0.0, false)
    } else {
        remaining_straights -= 1;
        Piece::straight(0.0, 0.0, 0.0)
    };
    let mut pieces = vec![first];

    while remaining_straights + remaining_curves > 0 {
        let Some(next) = next_connected_piece(&pieces, remaining_straights, remaining_curves)
        else {
            break;
        };
        if next.kind == PieceKind::Straight {
            remaining_straights -= 1;
        } else {
            remaining_curves -= 1;
        }
        pieces.push(next);
    }

    place_aside(&mut pieces, remaining_straights, remaining_curves);
    pieces
}

/// A piece joined onto the first open connection of the layout, curves
/// preferred while any remain.
fn next_connected_piece(pieces: &[Piece], straights: usize, curves: usize) -> Option<Piece> {
    let (owner, target) = *open_ends(pieces).first()?;
    let mut kinds = Vec::with_capacity(2);
    if curves > 0 {
        kinds.push(PieceKind::Curve { flipped: false });
    }
    if straights > 0 {
        kinds.push(PieceKind::Straight);
    }

    for kind in kinds {
        let points = connection_points(&Piece::new(kind, 0.0, 0.0, 0.0)).len();
        for index in 0..points {
            let Some(candidate) = align_to(kind, index, &target) else {
                continue;
            };
            let point = connection_points(&candidate)[index];
            if is_valid_connection_types(&pieces[owner], &candidate, &target, &point)
                && !check_collision(&candidate, pieces)
            {
                return Some(candidate);
            }
        }
    }
    None
}

/// Parks leftover pieces in columns to the right of the layout.
fn place_aside(pieces: &mut Vec<Piece>, straights: usize, curves: usize) {
    let mut x = SIDE_ORIGIN_X;
    let mut y = 0.0;
    let kinds = std::iter::repeat_n(PieceKind::Straight, straights)
        .chain(std::iter::repeat_n(PieceKind::Curve { flipped: false }, curves));
    for kind in kinds {
        pieces.push(Piece::new(kind, x, y, 0.0));
        y += SIDE_PITCH_Y;
        if y > SIDE_WRAP_Y {
            y = 0.0;
            x += SIDE_PITCH_X;
        }
    }
}

/// Open chain, each piece's first point on the previous piece's second.
/// Every third piece is a curve while both kinds remain.
fn linear_chain(straights: usize, curves: usize) -> Vec<Piece> {
    let mut remaining_straights = straights;
    let mut remaining_curves = curves;
    let mut pieces: Vec<Piece> = Vec::with_capacity(straights + curves);

    while remaining_straights + remaining_curves > 0 {
        let kind = if remaining_straights == 0
            || (remaining_curves > 0 && pieces.len() % 3 == 0)
        {
            remaining_curves -= 1;
            PieceKind::Curve { flipped: false }
        } else {
            remaining_straights -= 1;
            PieceKind::Straight
        };

        let next = match pieces.last() {
            None => Piece::new(kind, 0.0, 0.0, 0.0),
            Some(previous) => {
                let exit = connection_points(previous)[1];
                align_to(kind, 0, &exit).unwrap_or(Piece::new(kind, exit.x, exit.y, 0.0))
            }
        };
        pieces.push(next);
    }
    pieces
}

fn scattered(straights: usize, curves: usize) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(straights + curves);
    let mut x = 0.0;
    let mut y = 0.0;
    let kinds = std::iter::repeat_n(PieceKind::Straight, straights)
        .chain(std::iter::repeat_n(PieceKind::Curve { flipped: false }, curves));
    for kind in kinds {
        pieces.push(Piece::new(kind, x, y, 0.0));
        x += SCATTER_PITCH_X;
        if x > SCATTER_WRAP_X {
            x = 0.0;
            y += SCATTER_PITCH_Y;
        }
    }
    pieces
}
