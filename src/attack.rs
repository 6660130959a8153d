//! Garbage sent to the opponent for one lock.
//!
//! Inputs are taken before the lock updates the side's counters: `combo` is
//! the chain length prior to this lock and `back_to_back` is whether the
//! previous clear qualified.

use serde::Serialize;

/// Bonus added on top of base lines when a clear empties the board.
pub const ALL_CLEAR_BONUS: u32 = 7;
pub const BACK_TO_BACK_BONUS: u32 = 1;

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, Default)]
pub struct Attack {
    pub lines: u32,
    /// Whether this clear keeps (or starts) a back-to-back chain.
    pub qualifies: bool,
    pub all_clear: bool,
}

pub fn base_lines(cleared: usize) -> u32 {
    match cleared {
        0 | 1 => 0,
        2 => 1,
        3 => 2,
        _ => 4,
    }
}

pub fn combo_bonus(combo: u32) -> u32 {
    match combo {
        0 | 1 => 0,
        2 | 3 => 1,
        4 | 5 => 2,
        n => 2 + (n - 4) / 2,
    }
}

/// `board_empty` is the state of the board after rows were cleared.
pub fn compute_attack(cleared: usize, board_empty: bool, combo: u32, back_to_back: bool) -> Attack {
    let mut lines = base_lines(cleared);
    let mut qualifies = cleared == 4;

    let all_clear = board_empty && cleared > 0;
    if all_clear {
        lines += ALL_CLEAR_BONUS;
        qualifies = true;
    }

    lines += combo_bonus(combo);
    if back_to_back && qualifies {
        lines += BACK_TO_BACK_BONUS;
    }

    Attack {
        lines,
        qualifies,
        all_clear,
    }
}
