//! Two-board versus block-stacking game: the simulation core, a browser
//! client over `wasm-bindgen`, and the leaderboard handlers the native
//! server exposes.

pub mod attack;
pub mod board;
pub mod client;
pub mod input;
pub mod leaderboard;
pub mod piece;
pub mod rotation;
pub mod sequencer;
pub mod settings;
pub mod shape;
pub mod versus;
pub mod view;

pub use attack::{compute_attack, Attack};
pub use board::{Board, Cell, COLS, ROWS};
pub use input::{Action, ControlBindings, InputEvent, KeyPhase, Side};
pub use piece::{Piece, Point};
pub use sequencer::{Sequencer, PREVIEW_DEPTH};
pub use settings::{MatchSettings, TieBreak};
pub use shape::{mask_for, Color, Mask, PieceKind};
pub use versus::{LockReport, Outcome, Versus};
pub use view::{FrameView, PlayerView};
