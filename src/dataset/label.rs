//! Piece color labels
//!
//! Labels are derived from filenames of the form `<color>-<anything>.<ext>`.
//! The color table is a closed enumeration with an explicit `Unknown`
//! variant; files whose prefix is not one of the five piece colors map to
//! `Unknown` and the caller decides whether those samples enter training.

use serde::{Deserialize, Serialize};

/// The closed set of piece colors the classifier distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum PieceColor {
    Unknown = 0,
    Blue = 1,
    Black = 2,
    Green = 3,
    Red = 4,
    Yellow = 5,
}

impl PieceColor {
    /// All variants in class-id order
    pub const ALL: [PieceColor; 6] = [
        PieceColor::Unknown,
        PieceColor::Blue,
        PieceColor::Black,
        PieceColor::Green,
        PieceColor::Red,
        PieceColor::Yellow,
    ];

    /// Integer class id used as the training target
    pub fn id(self) -> usize {
        self as usize
    }

    /// Map a class id back to a color, e.g. when decoding model output
    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    /// Lowercase color name as it appears in filenames
    pub fn name(self) -> &'static str {
        match self {
            PieceColor::Unknown => "unknown",
            PieceColor::Blue => "blue",
            PieceColor::Black => "black",
            PieceColor::Green => "green",
            PieceColor::Red => "red",
            PieceColor::Yellow => "yellow",
        }
    }

    /// Derive a label from an image filename.
    ///
    /// The segment before the first `-` is matched case-sensitively against
    /// the color table; anything else (including a name with no `-`) yields
    /// `Unknown`.
    pub fn from_filename(filename: &str) -> Self {
        let prefix = filename.split('-').next().unwrap_or(filename);
        match prefix {
            "blue" => PieceColor::Blue,
            "black" => PieceColor::Black,
            "green" => PieceColor::Green,
            "red" => PieceColor::Red,
            "yellow" => PieceColor::Yellow,
            _ => PieceColor::Unknown,
        }
    }
}

impl std::fmt::Display for PieceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
