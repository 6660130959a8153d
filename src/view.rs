use serde::Serialize;

use crate::board::{Board, Cell, COLS, ROWS};
use crate::input::Side;
use crate::piece::{Piece, Point};
use crate::shape::{Color, PieceKind};
use crate::versus::{Outcome, Player, Versus};

/// Everything the canvas needs for one side.
#[derive(Serialize, Debug)]
pub struct PlayerView {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `rows * cols` entries.
    pub cells: Vec<Cell>,
    pub active: Vec<Point>,
    pub active_color: Color,
    pub ghost: Vec<Point>,
    pub hold: Option<PieceKind>,
    pub hold_blocks: Option<Vec<Point>>,
    pub hold_used: bool,
    pub next: Vec<PieceKind>,
    pub next_blocks: Vec<Vec<Point>>,
    pub score: u32,
    pub combo: u32,
    pub back_to_back: bool,
    pub lines_sent: u32,
    pub running: bool,
}

#[derive(Serialize, Debug)]
pub struct FrameView {
    pub players: Vec<PlayerView>,
    pub outcome: Option<Outcome>,
}

/// Cells of `piece` that fall inside the visible board.
pub fn visible_cells(piece: &Piece) -> Vec<Point> {
    piece
        .cells()
        .filter(|p| (0..ROWS as i32).contains(&p.y) && (0..COLS as i32).contains(&p.x))
        .collect()
}

fn preview_blocks(kind: PieceKind) -> Vec<Point> {
    Piece::spawn(kind).placed_at(0, 0).cells().collect()
}

fn board_cells(board: &Board) -> Vec<Cell> {
    board.rows().flat_map(|row| row.iter().copied()).collect()
}

impl PlayerView {
    pub fn new(player: &Player, ghost_enabled: bool) -> Self {
        let active = player.active();
        let ghost = if ghost_enabled && player.running() {
            visible_cells(&player.board().ghost(active))
        } else {
            Vec::new()
        };
        let next = player.preview();
        Self {
            rows: ROWS,
            cols: COLS,
            cells: board_cells(player.board()),
            active: visible_cells(active),
            active_color: active.color(),
            ghost,
            hold: player.hold().map(|h| h.kind),
            hold_blocks: player.hold().map(|h| h.cells().collect()),
            hold_used: player.hold_used(),
            next_blocks: next.iter().map(|k| preview_blocks(*k)).collect(),
            next,
            score: player.score(),
            combo: player.combo(),
            back_to_back: player.back_to_back(),
            lines_sent: player.lines_sent(),
            running: player.running(),
        }
    }
}

impl Versus {
    pub fn snapshot(&self) -> FrameView {
        let ghost_enabled = self.settings().ghost_enabled;
        FrameView {
            players: Side::both()
                .iter()
                .map(|side| PlayerView::new(self.player(*side), ghost_enabled))
                .collect(),
            outcome: self.outcome(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Action;
    use crate::settings::MatchSettings;

    fn seeded() -> Versus {
        Versus::new(MatchSettings {
            seed: Some(21),
            ..MatchSettings::default()
        })
    }

    #[test]
    fn snapshot_has_both_boards() {
        let v = seeded();
        let frame = v.snapshot();
        assert_eq!(frame.players.len(), 2);
        for p in &frame.players {
            assert_eq!(p.cells.len(), ROWS * COLS);
            assert_eq!(p.next.len(), 5);
            assert_eq!(p.next_blocks.len(), 5);
            assert!(p.running);
        }
        assert!(frame.outcome.is_none());
    }

    #[test]
    fn ghost_sits_on_floor_of_empty_board() {
        let v = seeded();
        let frame = v.snapshot();
        let ghost = &frame.players[0].ghost;
        assert_eq!(ghost.len(), 4);
        assert_eq!(ghost.iter().map(|p| p.y).max(), Some(ROWS as i32 - 1));
    }

    #[test]
    fn ghost_can_be_disabled() {
        let v = Versus::new(MatchSettings {
            seed: Some(21),
            ghost_enabled: false,
            ..MatchSettings::default()
        });
        assert!(v.snapshot().players[0].ghost.is_empty());
    }

    #[test]
    fn hidden_rows_are_not_drawn() {
        let piece = Piece::spawn(PieceKind::T);
        assert!(visible_cells(&piece).is_empty());
        assert_eq!(visible_cells(&piece.shifted(0, 1)).len(), 3);
    }

    #[test]
    fn locked_cells_show_up_after_drop() {
        let mut v = seeded();
        v.apply(Side::Player, Action::HardDrop);
        let frame = v.snapshot();
        let filled = frame.players[0].cells.iter().filter(|c| c.is_filled()).count();
        assert_eq!(filled, 4);
    }

    #[test]
    fn serializes_cells_with_tags() {
        let json = serde_json::to_value(seeded().snapshot()).expect("serialize");
        assert_eq!(json["players"][0]["cells"][0]["kind"], "empty");
        assert!(json["outcome"].is_null());
    }
}
