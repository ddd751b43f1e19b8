use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

/// Geometric family of a piece. Switches snap, collide and alternate
/// polarity like curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Straight,
    Curve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Straight,
    Curve { flipped: bool },
    Switch { hand: Hand, flipped: bool },
}

impl PieceKind {
    pub fn family(&self) -> Family {
        match self {
            PieceKind::Straight => Family::Straight,
            PieceKind::Curve { .. } | PieceKind::Switch { .. } => Family::Curve,
        }
    }

    pub fn flipped(&self) -> bool {
        match *self {
            PieceKind::Straight => false,
            PieceKind::Curve { flipped } | PieceKind::Switch { flipped, .. } => flipped,
        }
    }

    /// Same kind with the mirror state replaced. Straights are symmetric and
    /// stay unchanged.
    pub fn with_flipped(self, flipped: bool) -> Self {
        match self {
            PieceKind::Straight => PieceKind::Straight,
            PieceKind::Curve { .. } => PieceKind::Curve { flipped },
            PieceKind::Switch { hand, .. } => PieceKind::Switch { hand, flipped },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::Straight => "straight",
            PieceKind::Curve { .. } => "curve",
            PieceKind::Switch {
                hand: Hand::Left, ..
            } => "switch-left",
            PieceKind::Switch {
                hand: Hand::Right, ..
            } => "switch-right",
        }
    }

    /// Parses a persisted type name. Accepts the camel-case switch spellings
    /// older layouts were saved with.
    pub fn parse(name: &str, flipped: bool) -> Option<Self> {
        match name {
            "straight" => Some(PieceKind::Straight),
            "curve" => Some(PieceKind::Curve { flipped }),
            "switch-left" | "switchLeft" => Some(PieceKind::Switch {
                hand: Hand::Left,
                flipped,
            }),
            "switch-right" | "switchRight" => Some(PieceKind::Switch {
                hand: Hand::Right,
                flipped,
            }),
            _ => None,
        }
    }
}

/// A track segment placed on the grid. Coordinates are grid units, rotation
/// is radians from the piece's local frame to world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PieceRecord", into = "PieceRecord")]
pub struct Piece {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(kind: PieceKind, x: f64, y: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            rotation,
            kind,
        }
    }

    pub fn straight(x: f64, y: f64, rotation: f64) -> Self {
        Self::new(PieceKind::Straight, x, y, rotation)
    }

    pub fn curve(x: f64, y: f64, rotation: f64, flipped: bool) -> Self {
        Self::new(PieceKind::Curve { flipped }, x, y, rotation)
    }

    pub fn switch(hand: Hand, x: f64, y: f64, rotation: f64, flipped: bool) -> Self {
        Self::new(PieceKind::Switch { hand, flipped }, x, y, rotation)
    }

    pub fn family(&self) -> Family {
        self.kind.family()
    }

    pub fn flipped(&self) -> bool {
        self.kind.flipped()
    }

    pub fn distance_to(&self, other: &Piece) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} @ ({:.2}, {:.2}) rot {:.1}°",
            self.kind.name(),
            self.x,
            self.y,
            self.rotation.to_degrees()
        )?;
        if self.flipped() {
            write!(f, " [flipped]")?;
        }
        Ok(())
    }
}

/// Flat persisted form of a piece: `{x, y, type, rotation, flipped?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceRecord {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flipped: Option<bool>,
}

impl TryFrom<PieceRecord> for Piece {
    type Error = String;

    fn try_from(record: PieceRecord) -> Result<Self, Self::Error> {
        let kind = PieceKind::parse(&record.kind, record.flipped.unwrap_or(false))
            .ok_or_else(|| format!("invalid piece type '{}'", record.kind))?;
        Ok(Piece::new(kind, record.x, record.y, record.rotation))
    }
}

impl From<Piece> for PieceRecord {
    fn from(piece: Piece) -> Self {
        let flipped = match piece.kind {
            PieceKind::Straight => None,
            _ => Some(piece.flipped()),
        };
        PieceRecord {
            x: piece.x,
            y: piece.y,
            kind: piece.kind.name().to_string(),
            rotation: piece.rotation,
            flipped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Male,
    Female,
}

impl Polarity {
    pub fn is_opposite(self, other: Polarity) -> bool {
        self != other
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Male => write!(f, "male"),
            Polarity::Female => write!(f, "female"),
        }
    }
}

/// A derived attachment point in world space. `angle` is the outward facing
/// direction; two points join when their angles oppose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    #[serde(rename = "type")]
    pub polarity: Polarity,
}

impl ConnectionPoint {
    pub fn distance_to(&self, other: &ConnectionPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub position: Position,
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flipped: Option<bool>,
}

impl SnapResult {
    pub fn apply(&self, piece: &Piece) -> Piece {
        let kind = match self.flipped {
            Some(flipped) => piece.kind.with_flipped(flipped),
            None => piece.kind,
        };
        Piece::new(kind, self.position.x, self.position.y, self.rotation)
    }
}
