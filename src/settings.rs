use serde::{Deserialize, Serialize};

use crate::input::ControlBindings;

/// Who wins when one lock tops out both boards.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The locking side is checked first, so it loses.
    #[default]
    FirstChecked,
    Draw,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct MatchSettings {
    pub gravity_ms: f32,
    pub soft_drop_ms: f32,
    pub ghost_enabled: bool,
    /// Fixes piece order and garbage holes for both sides.
    pub seed: Option<u64>,
    pub tie_break: TieBreak,
    pub bindings: ControlBindings,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            gravity_ms: 450.0,
            soft_drop_ms: 50.0,
            ghost_enabled: true,
            seed: None,
            tie_break: TieBreak::FirstChecked,
            bindings: ControlBindings::default(),
        }
    }
}
