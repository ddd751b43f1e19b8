use std::collections::VecDeque;

use crate::connection::can_connect;
use crate::geometry::connection_points;
use crate::placement::CONNECTION_PROXIMITY;
use crate::types::{ConnectionPoint, Piece};

pub fn joined(piece1: &Piece, piece2: &Piece) -> bool {
    let points2 = connection_points(piece2);
    connection_points(piece1).iter().any(|a| {
        points2
            .iter()
            .any(|b| a.distance_to(b) <= CONNECTION_PROXIMITY && can_connect(a, b))
    })
}

/// Indices of every piece reachable from `anchor` through joins, in
/// breadth-first order starting with `anchor`.
pub fn connected_pieces(pieces: &[Piece], anchor: usize) -> Vec<usize> {
    if anchor >= pieces.len() {
        return Vec::new();
    }
    let mut visited = vec![false; pieces.len()];
    let mut queue = VecDeque::new();
    let mut group = Vec::new();
    visited[anchor] = true;
    queue.push_back(anchor);
    while let Some(current) = queue.pop_front() {
        group.push(current);
        for (next, piece) in pieces.iter().enumerate() {
            if !visited[next] && joined(&pieces[current], piece) {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }
    group
}

/// Connection points with no partner on any other piece, tagged with the
/// index of the piece they belong to.
pub fn open_ends(pieces: &[Piece]) -> Vec<(usize, ConnectionPoint)> {
    let points: Vec<Vec<ConnectionPoint>> = pieces.iter().map(connection_points).collect();
    let mut open = Vec::new();
    for (i, own) in points.iter().enumerate() {
        for point in own {
            let partnered = points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .any(|(_, other)| other.iter().any(|q| can_connect(point, q)));
            if !partnered {
                open.push((i, *point));
            }
        }
    }
    open
}

pub fn open_connections(pieces: &[Piece]) -> Vec<ConnectionPoint> {
    open_ends(pieces).into_iter().map(|(_, p)| p).collect()
}
