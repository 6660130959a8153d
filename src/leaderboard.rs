//! Score records and the two serverless-style handlers behind the
//! leaderboard: a scan-and-sort read and a single-record write.
//!
//! Nothing here touches a running match; the client only hands over a
//! final score.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Records read per scan, mirroring the table scan limit.
pub const SCAN_LIMIT: usize = 1000;
/// Records returned by a read regardless of the limit asked for.
pub const RESPONSE_CAP: usize = 50;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ScoreRecord {
    pub username: String,
    /// Any finite number; scores arrive from JavaScript.
    pub score: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Body the client posts at game over.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ScoreSubmission {
    #[serde(default)]
    pub username: Option<String>,
    /// Left raw so numeric strings and fractions coerce the way a
    /// JavaScript `Number()` call would.
    #[serde(default)]
    pub score: Option<Value>,
}

impl ScoreSubmission {
    pub fn new(username: impl Into<String>, score: u64) -> Self {
        Self {
            username: Some(username.into()),
            score: Some(Value::from(score)),
        }
    }
}

/// `null` and a missing field are the same thing; a blank string is zero.
fn coerce_score(raw: Option<Value>) -> Result<f64> {
    let number = match raw {
        None | Some(Value::Null) => return Err(LeaderboardError::MissingField),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or(LeaderboardError::BadScore)
}

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("username and score required")]
    MissingField,
    #[error("malformed score body: {0}")]
    BadBody(#[from] serde_json::Error),
    #[error("score is not a number")]
    BadScore,
    #[error("score store: {0}")]
    Io(#[from] std::io::Error),
    #[error("score store lock poisoned")]
    Poisoned,
}

impl LeaderboardError {
    pub fn status_code(&self) -> u16 {
        match self {
            LeaderboardError::MissingField | LeaderboardError::BadScore | LeaderboardError::BadBody(_) => 400,
            LeaderboardError::Io(_) | LeaderboardError::Poisoned => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;

/// Backing table: single-item puts and an unordered bounded scan.
pub trait ScoreStore: Send + Sync {
    fn put(&self, record: ScoreRecord) -> Result<()>;
    fn scan(&self, limit: usize) -> Result<Vec<ScoreRecord>>;
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ScoreRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn put(&self, record: ScoreRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| LeaderboardError::Poisoned)?
            .push(record);
        Ok(())
    }

    fn scan(&self, limit: usize) -> Result<Vec<ScoreRecord>> {
        let records = self.records.lock().map_err(|_| LeaderboardError::Poisoned)?;
        Ok(records.iter().take(limit).cloned().collect())
    }
}

/// Whole table kept as one JSON array on disk, rewritten on every put.
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<ScoreRecord>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => serde_json::from_str(&text).map_err(corrupt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A table that cannot be parsed is a server-side failure, not a bad request.
fn corrupt(e: serde_json::Error) -> LeaderboardError {
    LeaderboardError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl ScoreStore for JsonFileStore {
    fn put(&self, record: ScoreRecord) -> Result<()> {
        let _guard = self.guard.lock().map_err(|_| LeaderboardError::Poisoned)?;
        let mut records = self.load()?;
        records.push(record);
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&records).map_err(corrupt)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn scan(&self, limit: usize) -> Result<Vec<ScoreRecord>> {
        let _guard = self.guard.lock().map_err(|_| LeaderboardError::Poisoned)?;
        let mut records = self.load()?;
        records.truncate(limit);
        Ok(records)
    }
}

/// Status code plus JSON body, shaped like a function-as-a-service reply.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    fn ok(body: serde_json::Value) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    fn error(err: &LeaderboardError) -> Self {
        Self {
            status_code: err.status_code(),
            body: json!({ "error": err.to_string() }).to_string(),
        }
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Highest scores first, at most `min(limit, RESPONSE_CAP)` of them.
pub fn top_scores(store: &dyn ScoreStore, limit: usize) -> Result<Vec<ScoreRecord>> {
    let mut records = store.scan(SCAN_LIMIT)?;
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
    records.truncate(limit.min(RESPONSE_CAP));
    Ok(records)
}

/// Validates a submission and stores it with the given timestamp.
pub fn record_score(store: &dyn ScoreStore, submission: ScoreSubmission, timestamp: u64) -> Result<ScoreRecord> {
    let username = submission
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or(LeaderboardError::MissingField)?;
    let score = coerce_score(submission.score)?;
    let record = ScoreRecord {
        username,
        score,
        timestamp,
    };
    store.put(record.clone())?;
    Ok(record)
}

pub fn get_scores(store: &dyn ScoreStore, limit: usize) -> HandlerResponse {
    match top_scores(store, limit) {
        Ok(records) => HandlerResponse::ok(json!(records)),
        Err(e) => {
            log::error!("reading scores: {e}");
            HandlerResponse::error(&e)
        }
    }
}

pub fn save_score(store: &dyn ScoreStore, body: &str) -> HandlerResponse {
    let parsed = if body.trim().is_empty() {
        Ok(ScoreSubmission::default())
    } else {
        serde_json::from_str::<ScoreSubmission>(body).map_err(LeaderboardError::from)
    };
    match parsed.and_then(|s| record_score(store, s, now_ms())) {
        Ok(item) => HandlerResponse::ok(json!({ "message": "Saved", "item": item })),
        Err(e) => {
            log::warn!("rejected score: {e}");
            HandlerResponse::error(&e)
        }
    }
}

/// What the presentation layer may ask of the leaderboard.
pub trait Leaderboard {
    fn fetch_top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>>;
    fn submit_score(&self, username: &str, score: u64) -> Result<ScoreRecord>;
}

/// Leaderboard served straight from a store in the same process.
pub struct LocalLeaderboard<S> {
    store: S,
}

impl<S: ScoreStore> LocalLeaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ScoreStore> Leaderboard for LocalLeaderboard<S> {
    fn fetch_top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>> {
        top_scores(&self.store, limit)
    }

    fn submit_score(&self, username: &str, score: u64) -> Result<ScoreRecord> {
        record_score(&self.store, ScoreSubmission::new(username, score), now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            username: name.to_string(),
            score,
            timestamp: 1,
        }
    }

    #[test]
    fn top_scores_sorted_descending() {
        let store = MemoryStore::new();
        for (name, score) in [("a", 300.0), ("b", 900.0), ("c", 100.0)] {
            store.put(record(name, score)).unwrap();
        }
        let top = top_scores(&store, 10).unwrap();
        let scores: Vec<_> = top.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![900.0, 300.0, 100.0]);
    }

    #[test]
    fn top_scores_capped() {
        let store = MemoryStore::new();
        for i in 0..80 {
            store.put(record("p", f64::from(i))).unwrap();
        }
        assert_eq!(top_scores(&store, 500).unwrap().len(), RESPONSE_CAP);
        assert_eq!(top_scores(&store, 3).unwrap().len(), 3);
        assert_eq!(top_scores(&store, 3).unwrap()[0].score, 79.0);
    }

    #[test]
    fn record_requires_username_and_score() {
        let store = MemoryStore::new();
        let missing_name = ScoreSubmission {
            username: None,
            score: Some(Value::from(5)),
        };
        let blank_name = ScoreSubmission {
            username: Some("  ".into()),
            score: Some(Value::from(5)),
        };
        let missing_score = ScoreSubmission {
            username: Some("x".into()),
            score: None,
        };
        let null_score = ScoreSubmission {
            username: Some("x".into()),
            score: Some(Value::Null),
        };
        for s in [missing_name, blank_name, missing_score, null_score] {
            assert!(matches!(
                record_score(&store, s, 0),
                Err(LeaderboardError::MissingField)
            ));
        }
        assert!(store.scan(10).unwrap().is_empty());
    }

    #[test]
    fn zero_score_is_accepted() {
        let store = MemoryStore::new();
        let rec = record_score(&store, ScoreSubmission::new("zero", 0), 42).unwrap();
        assert_eq!(rec, ScoreRecord { username: "zero".into(), score: 0.0, timestamp: 42 });
    }

    #[test]
    fn save_handler_status_codes() {
        let store = MemoryStore::new();
        let ok = save_score(&store, r#"{"username":"ann","score":1200}"#);
        assert_eq!(ok.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&ok.body).unwrap();
        assert_eq!(body["message"], "Saved");
        assert_eq!(body["item"]["username"], "ann");
        assert_eq!(body["item"]["score"].as_f64(), Some(1200.0));

        let missing = save_score(&store, r#"{"username":"ann"}"#);
        assert_eq!(missing.status_code, 400);
        assert!(missing.body.contains("username and score required"));

        assert_eq!(save_score(&store, "").status_code, 400);
        assert_eq!(save_score(&store, "{not json").status_code, 400);
    }

    #[test]
    fn scores_coerce_like_javascript_numbers() {
        let store = MemoryStore::new();
        for (raw, expected) in [(r#""1200""#, 1200.0), ("12.5", 12.5), ("-5", -5.0), (r#"" ""#, 0.0), ("true", 1.0)] {
            let reply = save_score(&store, &format!(r#"{{"username":"ann","score":{raw}}}"#));
            assert_eq!(reply.status_code, 200, "score {raw}");
            let body: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
            assert_eq!(body["item"]["score"].as_f64(), Some(expected), "score {raw}");
        }

        let null = save_score(&store, r#"{"username":"ann","score":null}"#);
        assert_eq!(null.status_code, 400);
        assert!(null.body.contains("username and score required"));

        let word = save_score(&store, r#"{"username":"ann","score":"lots"}"#);
        assert_eq!(word.status_code, 400);
        assert!(word.body.contains("score is not a number"));
        assert_eq!(store.scan(10).unwrap().len(), 5);
    }

    #[test]
    fn local_leaderboard_round_trip() {
        let board = LocalLeaderboard::new(MemoryStore::new());
        board.submit_score("low", 100).unwrap();
        board.submit_score("high", 700).unwrap();
        let top = board.fetch_top_scores(1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].username, "high");
        assert!(top[0].timestamp > 0);
    }
}
