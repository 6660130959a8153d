use serde::Serialize;

use crate::rotation::rotate;
use crate::shape::{mask_for, Color, Mask, PieceKind};

pub const SPAWN_COL: i32 = 3;
pub const SPAWN_ROW: i32 = -2;

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A piece in board coordinates. `col`/`row` anchor the mask's top-left
/// corner and may be negative while the piece sits above the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub mask: Mask,
    pub col: i32,
    pub row: i32,
}

impl Piece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            mask: mask_for(kind),
            col: SPAWN_COL,
            row: SPAWN_ROW,
        }
    }

    pub fn color(&self) -> Color {
        self.kind.color()
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            col: self.col + dx,
            row: self.row + dy,
            ..*self
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            mask: rotate(&self.mask),
            ..*self
        }
    }

    /// Same piece and orientation moved to the given anchor.
    pub fn placed_at(&self, col: i32, row: i32) -> Self {
        Self { col, row, ..*self }
    }

    /// Occupied cells in board coordinates, including rows above the board.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.mask.cells().map(move |(r, c)| Point {
            x: self.col + c as i32,
            y: self.row + r as i32,
        })
    }
}
