//! Saves and restores `SessionState` through a `KvStore`.
//!
//! Writes are fire-and-forget: anything that fails is logged and the rest still goes
//! out. Reads are best-effort: a damaged entry comes back as its default.

use super::state::SessionState;
use super::store::KvStore;
use crate::lookup::{QueryResult, SessionError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const KEY_INPUT: &str = "savedIPs";
pub const KEY_VIEW: &str = "savedResults";
pub const KEY_RESULT_DATA: &str = "savedResultData";
pub const KEY_HAS_RESULTS: &str = "hasResults";
pub const KEY_FILTER: &str = "activeFilter";
pub const KEY_SAVED_AT: &str = "savedAt";

const ALL_KEYS: [&str; 6] = [
    KEY_INPUT,
    KEY_VIEW,
    KEY_RESULT_DATA,
    KEY_HAS_RESULTS,
    KEY_FILTER,
    KEY_SAVED_AT,
];

pub struct SessionPersistence {
    store: Box<dyn KvStore>,
}

impl SessionPersistence {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    /// Write `state`, returning the timestamp recorded with it.
    pub fn save(&mut self, state: &SessionState) -> DateTime<Utc> {
        let now = Utc::now();
        let mut items = Map::new();
        items.insert(KEY_INPUT.into(), Value::from(state.input_text.as_str()));
        items.insert(KEY_VIEW.into(), Value::from(state.rendered_view.as_str()));
        items.insert(KEY_HAS_RESULTS.into(), Value::from(state.has_results()));
        items.insert(KEY_FILTER.into(), Value::from(state.active_filter.as_str()));
        items.insert(KEY_SAVED_AT.into(), Value::from(now.timestamp_millis()));

        match encode_results(&state.last_results) {
            Ok(encoded) => {
                items.insert(KEY_RESULT_DATA.into(), Value::from(encoded));
            }
            Err(e) => log::warn!("Saving session without results: {}", e),
        }

        if let Err(e) = self.store.set(items) {
            log::warn!("Failed to save session: {:#}", e);
        }
        now
    }

    /// Restore the last saved state, or `None` when nothing was saved.
    pub fn load(&self) -> Option<SessionState> {
        let data = match self.store.get(&ALL_KEYS) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to read session: {:#}", e);
                return None;
            }
        };
        if data.is_empty() {
            return None;
        }

        let text = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let last_results = match data.get(KEY_RESULT_DATA).and_then(Value::as_str) {
            Some(encoded) => decode_results(encoded).unwrap_or_else(|e| {
                log::warn!("Discarding saved results: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let active_filter = data
            .get(KEY_FILTER)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let saved_at = data
            .get(KEY_SAVED_AT)
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis);

        Some(SessionState {
            input_text: text(KEY_INPUT),
            last_results,
            active_filter,
            rendered_view: text(KEY_VIEW),
            saved_at,
        })
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(&ALL_KEYS) {
            log::warn!("Failed to clear session: {:#}", e);
        }
    }
}

pub fn encode_results(results: &[QueryResult]) -> Result<String, SessionError> {
    serde_json::to_string(results).map_err(|e| SessionError::SerializationFailure(e.to_string()))
}

pub fn decode_results(encoded: &str) -> Result<Vec<QueryResult>, SessionError> {
    serde_json::from_str(encoded).map_err(|e| SessionError::SerializationFailure(e.to_string()))
}
