//! Flat piece-list persistence: a JSON array of
//! `{x, y, type, rotation, flipped?}` records.

use std::path::Path;

use crate::types::Piece;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("piece {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },
}

pub fn from_json(json: &str) -> Result<Vec<Piece>, LayoutError> {
    let pieces: Vec<Piece> = serde_json::from_str(json)?;
    check_finite(&pieces)?;
    Ok(pieces)
}

pub fn to_json(pieces: &[Piece]) -> Result<String, LayoutError> {
    Ok(serde_json::to_string_pretty(pieces)?)
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<Piece>, LayoutError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_json(&json)
}

/// Rejects coordinates or rotations that are NaN or infinite.
pub fn check_finite(pieces: &[Piece]) -> Result<(), LayoutError> {
    for (index, piece) in pieces.iter().enumerate() {
        let fields = [("x", piece.x), ("y", piece.y), ("rotation", piece.rotation)];
        if let Some((field, _)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(LayoutError::NonFinite { index, field });
        }
    }
    Ok(())
}
