use serde::{Deserialize, Serialize};

/// Largest mask edge; I is the only kind that needs all four rows.
pub const MAX_MASK: usize = 4;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    Z,
    T,
}

impl PieceKind {
    pub fn all() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::J,
            PieceKind::L,
            PieceKind::O,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::T,
        ]
    }

    pub fn color(self) -> Color {
        match self {
            PieceKind::I => Color("#00f0f0"),
            PieceKind::J => Color("#0000f0"),
            PieceKind::L => Color("#f0a000"),
            PieceKind::O => Color("#f0f000"),
            PieceKind::S => Color("#00f000"),
            PieceKind::Z => Color("#f00000"),
            PieceKind::T => Color("#a000f0"),
        }
    }
}

/// CSS color string handed straight to the canvas.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Color(pub &'static str);

pub const GARBAGE_COLOR: Color = Color("#888888");

/// Square occupancy mask of one piece orientation. Only the top-left
/// `size`×`size` corner of `bits` is meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mask {
    size: usize,
    bits: [[bool; MAX_MASK]; MAX_MASK],
}

impl Mask {
    /// Builds a mask from rows of 0/1. Panics on non-square input, which
    /// only the static table below ever provides.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let size = rows.len();
        assert!((2..=MAX_MASK).contains(&size), "mask size {size} out of range");
        let mut bits = [[false; MAX_MASK]; MAX_MASK];
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size, "mask row {r} is not square");
            for (c, &v) in row.iter().enumerate() {
                bits[r][c] = v != 0;
            }
        }
        Self { size, bits }
    }

    pub(crate) fn empty(size: usize) -> Self {
        Self {
            size,
            bits: [[false; MAX_MASK]; MAX_MASK],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.bits[row][col]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: bool) {
        self.bits[row][col] = value;
    }

    /// Occupied cells as (row, col) offsets from the mask's top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |r| {
            (0..self.size).filter_map(move |c| self.bits[r][c].then_some((r, c)))
        })
    }
}

pub fn mask_for(kind: PieceKind) -> Mask {
    match kind {
        PieceKind::I => Mask::from_rows(&[
            &[0, 0, 0, 0],
            &[1, 1, 1, 1],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
        ]),
        PieceKind::J => Mask::from_rows(&[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]]),
        PieceKind::L => Mask::from_rows(&[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]]),
        PieceKind::O => Mask::from_rows(&[&[1, 1], &[1, 1]]),
        PieceKind::S => Mask::from_rows(&[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]]),
        PieceKind::Z => Mask::from_rows(&[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]]),
        PieceKind::T => Mask::from_rows(&[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]]),
    }
}
