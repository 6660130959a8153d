use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    pub fn both() -> [Side; 2] {
        [Side::Player, Side::Opponent]
    }
}

/// One discrete input applied to a side. Held keys that repeat are the
/// presentation layer's business; each issuance is a single attempt.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDropStart,
    SoftDropEnd,
    Rotate,
    HardDrop,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "moveleft" => Ok(Action::MoveLeft),
            "right" | "moveright" => Ok(Action::MoveRight),
            "soft" | "softdropstart" => Ok(Action::SoftDropStart),
            "unsoft" | "softdropend" => Ok(Action::SoftDropEnd),
            "rotate" | "up" => Ok(Action::Rotate),
            "drop" | "harddrop" => Ok(Action::HardDrop),
            "hold" => Ok(Action::Hold),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum KeyPhase {
    Press,
    Release,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct InputEvent {
    pub side: Side,
    pub action: Action,
}

/// Key codes (`KeyboardEvent.code`) bound to each action.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct ControlBindings {
    pub move_left: Vec<String>,
    pub move_right: Vec<String>,
    pub soft_drop: Vec<String>,
    pub hard_drop: Vec<String>,
    pub rotate: Vec<String>,
    pub hold: Vec<String>,
}

impl Default for ControlBindings {
    fn default() -> Self {
        fn keys(ks: &[&str]) -> Vec<String> {
            ks.iter().map(|k| k.to_string()).collect()
        }
        Self {
            move_left: keys(&["ArrowLeft", "KeyA"]),
            move_right: keys(&["ArrowRight", "KeyD"]),
            soft_drop: keys(&["ArrowDown", "KeyS"]),
            hard_drop: keys(&["Space"]),
            rotate: keys(&["ArrowUp", "KeyW"]),
            hold: keys(&["KeyC"]),
        }
    }
}

impl ControlBindings {
    /// Soft drop is the only held action; every other binding fires on
    /// press and ignores release.
    pub fn action_for(&self, code: &str, phase: KeyPhase) -> Option<Action> {
        let bound = |keys: &[String]| keys.iter().any(|k| k == code);
        if bound(&self.soft_drop) {
            return Some(match phase {
                KeyPhase::Press => Action::SoftDropStart,
                KeyPhase::Release => Action::SoftDropEnd,
            });
        }
        if phase == KeyPhase::Release {
            return None;
        }
        if bound(&self.move_left) {
            Some(Action::MoveLeft)
        } else if bound(&self.move_right) {
            Some(Action::MoveRight)
        } else if bound(&self.hard_drop) {
            Some(Action::HardDrop)
        } else if bound(&self.rotate) {
            Some(Action::Rotate)
        } else if bound(&self.hold) {
            Some(Action::Hold)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_arrows_and_wasd() {
        let b = ControlBindings::default();
        assert_eq!(b.action_for("ArrowLeft", KeyPhase::Press), Some(Action::MoveLeft));
        assert_eq!(b.action_for("KeyD", KeyPhase::Press), Some(Action::MoveRight));
        assert_eq!(b.action_for("KeyW", KeyPhase::Press), Some(Action::Rotate));
        assert_eq!(b.action_for("Space", KeyPhase::Press), Some(Action::HardDrop));
        assert_eq!(b.action_for("KeyC", KeyPhase::Press), Some(Action::Hold));
        assert_eq!(b.action_for("KeyQ", KeyPhase::Press), None);
    }

    #[test]
    fn soft_drop_has_press_and_release() {
        let b = ControlBindings::default();
        assert_eq!(b.action_for("ArrowDown", KeyPhase::Press), Some(Action::SoftDropStart));
        assert_eq!(b.action_for("KeyS", KeyPhase::Release), Some(Action::SoftDropEnd));
        assert_eq!(b.action_for("ArrowLeft", KeyPhase::Release), None);
    }

    #[test]
    fn actions_parse_from_words() {
        assert_eq!("left".parse::<Action>(), Ok(Action::MoveLeft));
        assert_eq!(" Drop ".parse::<Action>(), Ok(Action::HardDrop));
        assert_eq!("softDropEnd".parse::<Action>(), Ok(Action::SoftDropEnd));
        assert!("jump".parse::<Action>().is_err());
    }

    #[test]
    fn sides_are_opposite() {
        for side in Side::both() {
            assert_ne!(side, side.other());
            assert_eq!(side.other().other(), side);
        }
    }
}
