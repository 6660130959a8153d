use std::collections::HashSet;

use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::input::{Action, KeyPhase, Side};
use crate::leaderboard::ScoreSubmission;
use crate::settings::MatchSettings;
use crate::versus::Versus;

/// Re-issue interval for a held left/right key.
const SHIFT_REPEAT_MS: f32 = 120.0;

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.level(), record.args()));
        match record.level() {
            log::Level::Error => console::error_1(&line),
            log::Level::Warn => console::warn_1(&line),
            _ => console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

struct HeldShift {
    code: String,
    action: Action,
    timer: f32,
}

/// Keyboard state plus the match it drives; everything the browser glue
/// needs that does not touch JS values.
struct Session {
    versus: Versus,
    pressed: HashSet<String>,
    held_shift: Option<HeldShift>,
}

impl Session {
    fn new(settings: MatchSettings) -> Self {
        Self {
            versus: Versus::new(settings),
            pressed: HashSet::new(),
            held_shift: None,
        }
    }

    fn tick(&mut self, dt_ms: f32) {
        if let Some(held) = self.held_shift.as_mut() {
            held.timer += dt_ms;
            while held.timer >= SHIFT_REPEAT_MS {
                held.timer -= SHIFT_REPEAT_MS;
                self.versus.apply(Side::Player, held.action);
            }
        }
        self.versus.advance(dt_ms);
    }

    fn key_down(&mut self, code: String) -> bool {
        let Some(action) = self.versus.settings().bindings.action_for(&code, KeyPhase::Press) else {
            return false;
        };
        // Ignore OS auto-repeat; held shifts repeat on our own timer.
        if !self.pressed.insert(code.clone()) {
            return true;
        }
        self.versus.apply(Side::Player, action);
        if matches!(action, Action::MoveLeft | Action::MoveRight) {
            self.held_shift = Some(HeldShift {
                code,
                action,
                timer: 0.0,
            });
        }
        true
    }

    fn key_up(&mut self, code: &str) -> bool {
        self.pressed.remove(code);
        if self.held_shift.as_ref().is_some_and(|h| h.code == code) {
            self.held_shift = None;
        }
        match self.versus.settings().bindings.action_for(code, KeyPhase::Release) {
            Some(action) => {
                self.versus.apply(Side::Player, action);
                true
            }
            None => false,
        }
    }

    fn restart(&mut self) {
        self.pressed.clear();
        self.held_shift = None;
        self.versus.restart();
        log::info!("match restarted");
    }
}

/// Browser-facing handle. Keyboard events arrive as `KeyboardEvent.code`
/// strings and only ever drive the player's board.
#[wasm_bindgen]
pub struct GameClient {
    session: Session,
}

#[wasm_bindgen]
impl GameClient {
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<GameClient, JsValue> {
        let settings: MatchSettings = from_value(settings).unwrap_or_default();
        Ok(Self {
            session: Session::new(settings),
        })
    }

    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self, dt_ms: f32) -> Result<JsValue, JsValue> {
        self.session.tick(dt_ms);
        self.snapshot()
    }

    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.versus.snapshot()).map_err(|e| e.into())
    }

    /// Returns whether the key is bound; the page uses this to suppress
    /// default browser scrolling.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, code: String) -> bool {
        self.session.key_down(code)
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&mut self, code: String) -> bool {
        self.session.key_up(&code)
    }

    /// Applies a named action (see `Action`'s `FromStr`) to the player.
    #[wasm_bindgen(js_name = action)]
    pub fn action(&mut self, name: String) -> Result<bool, JsValue> {
        let action: Action = name.parse().map_err(|e: crate::input::UnknownAction| JsValue::from_str(&e.to_string()))?;
        Ok(self.session.versus.apply(Side::Player, action))
    }

    #[wasm_bindgen(js_name = restart)]
    pub fn restart(&mut self) {
        self.session.restart();
    }

    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.session.versus.is_over()
    }

    /// JSON-ready body for posting the player's score to the leaderboard.
    #[wasm_bindgen(js_name = scoreSubmission)]
    pub fn score_submission(&self, username: String) -> Result<JsValue, JsValue> {
        let score = self.session.versus.player(Side::Player).score();
        to_value(&ScoreSubmission::new(username, u64::from(score))).map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = CAPTURED.lock() {
                lines.push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger;

    fn session() -> Session {
        Session::new(MatchSettings {
            seed: Some(4),
            ..MatchSettings::default()
        })
    }

    #[test]
    fn held_shift_repeats_on_timer() {
        let mut s = session();
        let start = s.versus.player(Side::Player).active().col;
        assert!(s.key_down("ArrowLeft".into()));
        assert_eq!(s.versus.player(Side::Player).active().col, start - 1);
        // OS auto-repeat is swallowed.
        s.key_down("ArrowLeft".into());
        assert_eq!(s.versus.player(Side::Player).active().col, start - 1);
        s.tick(SHIFT_REPEAT_MS);
        assert_eq!(s.versus.player(Side::Player).active().col, start - 2);
        assert!(!s.key_up("ArrowLeft"));
        s.tick(SHIFT_REPEAT_MS);
        assert_eq!(s.versus.player(Side::Player).active().col, start - 2);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut s = session();
        assert!(!s.key_down("KeyQ".into()));
        assert!(!s.key_up("KeyQ"));
    }

    #[test]
    fn soft_drop_follows_key_state() {
        let mut s = session();
        s.key_down("ArrowDown".into());
        assert!(s.versus.player(Side::Player).soft_drop());
        assert!(s.key_up("ArrowDown"));
        assert!(!s.versus.player(Side::Player).soft_drop());
    }

    #[test]
    fn restart_clears_keys_and_logs_through_facade() {
        if log::set_logger(&CAPTURE).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
        let mut s = session();
        s.key_down("ArrowLeft".into());
        s.versus.apply(Side::Player, Action::HardDrop);
        s.restart();
        assert!(s.pressed.is_empty());
        assert!(s.held_shift.is_none());
        assert!(s.versus.player(Side::Player).board().is_empty());
        let lines = CAPTURED.lock().unwrap();
        assert!(lines.iter().any(|l| l == "match restarted"));
    }
}
