use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// One answered query, as kept in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Data shared between the tasks of one session.
///
/// Holds a string-keyed JSON store that is overwritten on every submission and
/// the conversation history, which only ever grows until it is cleared as a
/// whole.
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
    history: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Store a value under `key`. Values that cannot be represented as JSON are
    /// stored as `null`.
    pub async fn set(&self, key: impl Into<String>, value: impl Serialize) {
        self.set_sync(key, value);
    }

    pub fn set_sync(&self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.into(), value);
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    /// Drop every per-submission value. History is left alone.
    pub async fn clear(&self) {
        self.data.clear();
    }

    pub async fn append_history(&self, entry: HistoryEntry) {
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        history.push(entry);
    }

    /// The last `limit` entries, newest first.
    pub async fn recent_history(&self, limit: usize) -> Vec<HistoryEntry> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        history.iter().rev().take(limit).cloned().collect()
    }

    pub async fn clear_history(&self) {
        let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
        history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
