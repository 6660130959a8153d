use rand::Rng;
use serde::Serialize;

use crate::piece::Piece;
use crate::shape::Color;

pub const ROWS: usize = 20;
pub const COLS: usize = 10;

/// Garbage is drawn in its own color but clears like any filled cell.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Default)]
#[serde(tag = "kind", content = "color", rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Locked(Color),
    Garbage,
}

impl Cell {
    pub fn is_filled(self) -> bool {
        !matches!(self, Cell::Empty)
    }
}

const EMPTY_ROW: [Cell; COLS] = [Cell::Empty; COLS];

/// Row 0 is the top visible row. Nothing outside the grid is ever stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [EMPTY_ROW; ROWS],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Returns false for coordinates outside the grid.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLS]> {
        self.cells.iter()
    }

    /// Walls and floor always collide; stack contents only collide for
    /// cells on the board, so pieces may hang above row 0.
    pub fn collides(&self, piece: &Piece) -> bool {
        piece.cells().any(|p| {
            if p.x < 0 || p.x >= COLS as i32 || p.y >= ROWS as i32 {
                return true;
            }
            p.y >= 0 && self.cells[p.y as usize][p.x as usize].is_filled()
        })
    }

    /// Writes the piece into the grid; cells above the board are dropped.
    pub fn lock(&mut self, piece: &Piece) {
        let color = piece.color();
        for p in piece.cells() {
            if (0..ROWS as i32).contains(&p.y) && (0..COLS as i32).contains(&p.x) {
                self.cells[p.y as usize][p.x as usize] = Cell::Locked(color);
            }
        }
    }

    /// Removes every filled row, pulling the stack down, and returns how
    /// many rows went.
    pub fn clear_filled_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut row = ROWS;
        while row > 0 {
            let r = row - 1;
            if self.cells[r].iter().all(|c| c.is_filled()) {
                cleared += 1;
                for pull in (1..=r).rev() {
                    self.cells[pull] = self.cells[pull - 1];
                }
                self.cells[0] = EMPTY_ROW;
                // re-test r: it now holds the row that was above it
            } else {
                row -= 1;
            }
        }
        cleared
    }

    /// Pushes `lines` garbage rows in from the bottom, each with one random
    /// hole. The top row is discarded for every line added.
    pub fn inject_garbage<R: Rng + ?Sized>(&mut self, lines: u32, rng: &mut R) {
        for _ in 0..lines {
            self.cells.copy_within(1.., 0);
            let mut row = [Cell::Garbage; COLS];
            row[rng.gen_range(0..COLS)] = Cell::Empty;
            self.cells[ROWS - 1] = row;
        }
    }

    pub fn is_topped_out(&self) -> bool {
        self.cells[0].iter().any(|c| c.is_filled())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|c| !c.is_filled())
    }

    /// Rows the piece can fall before it would collide.
    pub fn drop_distance(&self, piece: &Piece) -> i32 {
        let mut dist = 0;
        while !self.collides(&piece.shifted(0, dist + 1)) {
            dist += 1;
        }
        dist
    }

    /// Where a hard drop would leave the piece.
    pub fn ghost(&self, piece: &Piece) -> Piece {
        piece.shifted(0, self.drop_distance(piece))
    }
}
