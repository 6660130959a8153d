//! Two-board match engine.
//!
//! Every public operation runs to completion before returning, so a gravity
//! step, an input action and the lock sequence it may trigger (including
//! garbage pushed into the other board) are applied as one unit.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::attack::{compute_attack, Attack};
use crate::board::{Board, ROWS};
use crate::input::{Action, Side};
use crate::piece::{Piece, SPAWN_COL, SPAWN_ROW};
use crate::rotation::KICK_OFFSETS;
use crate::sequencer::Sequencer;
use crate::settings::{MatchSettings, TieBreak};
use crate::shape::PieceKind;

pub const POINTS_PER_LINE: u32 = 100;

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub enum Outcome {
    PlayerWins,
    OpponentWins,
    Draw,
}

impl Outcome {
    pub fn won_by(side: Side) -> Outcome {
        match side {
            Side::Player => Outcome::PlayerWins,
            Side::Opponent => Outcome::OpponentWins,
        }
    }
}

/// What the most recent lock on a side did.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq)]
pub struct LockReport {
    pub cleared: usize,
    pub attack: Attack,
}

#[derive(Clone, Debug)]
pub struct Player {
    board: Board,
    sequencer: Sequencer,
    active: Piece,
    hold: Option<Piece>,
    hold_used: bool,
    score: u32,
    combo: u32,
    back_to_back: bool,
    running: bool,
    soft_drop: bool,
    fall_accum: f32,
    lines_sent: u32,
    last_lock: Option<LockReport>,
}

impl Player {
    fn new(mut sequencer: Sequencer) -> Self {
        let first = sequencer.next();
        Self {
            board: Board::new(),
            sequencer,
            active: Piece::spawn(first),
            hold: None,
            hold_used: false,
            score: 0,
            combo: 0,
            back_to_back: false,
            running: true,
            soft_drop: false,
            fall_accum: 0.0,
            lines_sent: 0,
            last_lock: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> &Piece {
        &self.active
    }

    pub fn hold(&self) -> Option<&Piece> {
        self.hold.as_ref()
    }

    pub fn hold_used(&self) -> bool {
        self.hold_used
    }

    pub fn preview(&self) -> Vec<PieceKind> {
        self.sequencer.preview()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn back_to_back(&self) -> bool {
        self.back_to_back
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn soft_drop(&self) -> bool {
        self.soft_drop
    }

    pub fn lines_sent(&self) -> u32 {
        self.lines_sent
    }

    pub fn last_lock(&self) -> Option<LockReport> {
        self.last_lock
    }

    /// Raises the active piece until it clears a stack that was pushed up
    /// underneath it. Rows above the board never collide, so this ends.
    fn lift_active(&mut self) {
        let mut steps = 0;
        while self.board.collides(&self.active) && steps <= ROWS {
            self.active.row -= 1;
            steps += 1;
        }
    }
}

pub struct Versus {
    players: [Player; 2],
    settings: MatchSettings,
    outcome: Option<Outcome>,
    garbage_rng: StdRng,
}

impl Versus {
    pub fn new(settings: MatchSettings) -> Self {
        let mut master = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let player = Sequencer::new(StdRng::seed_from_u64(master.r#gen()));
        let opponent = Sequencer::new(StdRng::seed_from_u64(master.r#gen()));
        let garbage_rng = StdRng::seed_from_u64(master.r#gen());
        Self {
            players: [Player::new(player), Player::new(opponent)],
            settings,
            outcome: None,
            garbage_rng,
        }
    }

    /// Fresh boards and queues with the same settings.
    pub fn restart(&mut self) {
        *self = Versus::new(self.settings.clone());
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Applies one input. Returns whether anything changed; rejected
    /// actions leave the match untouched.
    pub fn apply(&mut self, side: Side, action: Action) -> bool {
        if !self.accepts_input(side) {
            return false;
        }
        match action {
            Action::MoveLeft => self.shift(side, -1),
            Action::MoveRight => self.shift(side, 1),
            Action::Rotate => self.rotate(side),
            Action::SoftDropStart => self.set_soft_drop(side, true),
            Action::SoftDropEnd => self.set_soft_drop(side, false),
            Action::HardDrop => {
                self.hard_drop(side);
                true
            }
            Action::Hold => self.hold(side),
        }
    }

    /// Feeds elapsed wall time to both sides' gravity timers, stepping each
    /// side once per elapsed period.
    pub fn advance(&mut self, dt_ms: f32) {
        for side in Side::both() {
            if !self.accepts_input(side) {
                continue;
            }
            let period = self.gravity_period(side);
            self.players[side.index()].fall_accum += dt_ms;
            while self.players[side.index()].fall_accum >= period {
                self.players[side.index()].fall_accum -= period;
                self.gravity(side);
                if self.is_over() {
                    return;
                }
            }
        }
    }

    pub fn gravity_period(&self, side: Side) -> f32 {
        let p = &self.players[side.index()];
        let period = if p.soft_drop {
            self.settings.soft_drop_ms
        } else {
            self.settings.gravity_ms
        };
        period.max(1.0)
    }

    /// One gravity step: fall a row, or lock where the piece stands and
    /// bring in the next one.
    pub fn gravity(&mut self, side: Side) {
        if !self.accepts_input(side) {
            return;
        }
        let p = &mut self.players[side.index()];
        let moved = p.active.shifted(0, 1);
        if !p.board.collides(&moved) {
            p.active = moved;
            return;
        }
        self.lock_and_continue(side);
    }

    fn accepts_input(&self, side: Side) -> bool {
        self.outcome.is_none() && self.players[side.index()].running
    }

    fn shift(&mut self, side: Side, dx: i32) -> bool {
        let p = &mut self.players[side.index()];
        let moved = p.active.shifted(dx, 0);
        if p.board.collides(&moved) {
            return false;
        }
        p.active = moved;
        true
    }

    fn rotate(&mut self, side: Side) -> bool {
        let p = &mut self.players[side.index()];
        let rotated = p.active.rotated();
        let fits = std::iter::once(0)
            .chain(KICK_OFFSETS)
            .map(|dx| rotated.shifted(dx, 0))
            .find(|candidate| !p.board.collides(candidate));
        match fits {
            Some(piece) => {
                p.active = piece;
                true
            }
            None => false,
        }
    }

    fn set_soft_drop(&mut self, side: Side, held: bool) -> bool {
        let p = &mut self.players[side.index()];
        if p.soft_drop == held {
            return false;
        }
        p.soft_drop = held;
        // the rate change restarts this side's gravity timer
        p.fall_accum = 0.0;
        true
    }

    fn hard_drop(&mut self, side: Side) {
        let p = &mut self.players[side.index()];
        p.active = p.board.ghost(&p.active);
        p.fall_accum = 0.0;
        self.lock_and_continue(side);
    }

    fn hold(&mut self, side: Side) -> bool {
        let p = &mut self.players[side.index()];
        if p.hold_used {
            return false;
        }
        let current = p.active.placed_at(0, 0);
        match p.hold.replace(current) {
            Some(held) => self.enter(side, held.placed_at(SPAWN_COL, SPAWN_ROW)),
            None => self.spawn(side),
        }
        self.players[side.index()].hold_used = true;
        true
    }

    fn lock_and_continue(&mut self, side: Side) {
        self.lock_sequence(side);
        if !self.is_over() {
            self.spawn(side);
        }
    }

    fn spawn(&mut self, side: Side) {
        let p = &mut self.players[side.index()];
        let kind = p.sequencer.next();
        p.hold_used = false;
        self.enter(side, Piece::spawn(kind));
    }

    /// Makes `piece` the active piece. A piece that cannot enter ends the
    /// match for its side.
    fn enter(&mut self, side: Side, piece: Piece) {
        let p = &mut self.players[side.index()];
        p.active = piece;
        if p.board.collides(&p.active) {
            info!("{side:?} blocked at spawn by {:?}", piece.kind);
            self.finish(Outcome::won_by(side.other()));
        }
    }

    fn lock_sequence(&mut self, side: Side) {
        let [first, second] = &mut self.players;
        let (me, them) = match side {
            Side::Player => (first, second),
            Side::Opponent => (second, first),
        };

        me.board.lock(&me.active);
        let cleared = me.board.clear_filled_rows();
        me.score += cleared as u32 * POINTS_PER_LINE;

        let attack = compute_attack(cleared, me.board.is_empty(), me.combo, me.back_to_back);
        if attack.lines > 0 {
            them.board.inject_garbage(attack.lines, &mut self.garbage_rng);
            them.lift_active();
            me.lines_sent += attack.lines;
            debug!("{side:?} sent {} lines (cleared {cleared})", attack.lines);
        }

        me.combo = if cleared > 0 { me.combo + 1 } else { 0 };
        me.back_to_back = attack.qualifies;
        me.last_lock = Some(LockReport { cleared, attack });

        let me_out = me.board.is_topped_out();
        let them_out = them.board.is_topped_out();
        let outcome = match (me_out, them_out) {
            (true, true) if self.settings.tie_break == TieBreak::Draw => Some(Outcome::Draw),
            (true, _) => Some(Outcome::won_by(side.other())),
            (false, true) => Some(Outcome::won_by(side)),
            (false, false) => None,
        };
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        info!("match over: {outcome:?}");
        self.outcome = Some(outcome);
        for p in self.players.iter_mut() {
            p.running = false;
        }
    }
}
