//! Display log of every payload received across the embedding boundary.

use std::collections::VecDeque;

use serde_json::Value;

/// Append-only, newest-first log of raw inbound payloads.
///
/// Grows without bound and never deduplicates: it exists only so the
/// operator can inspect what the configurator sent.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<Value>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `payload` as the most recent entry (index 0).
    pub fn record(&mut self, payload: Value) {
        self.entries.push_front(payload);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, where 0 is the newest.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.entries.get(index)
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter()
    }

    /// The whole log as a JSON array, newest first.
    pub fn to_json(&self) -> Value {
        Value::Array(self.entries.iter().cloned().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_log_is_empty() {
        let log = MessageLog::new();
        assert!(log.is_empty());
        assert_eq!(log.get(0), None);
    }

    #[test]
    fn test_most_recent_entry_is_first() {
        let mut log = MessageLog::new();

        log.record(json!({ "name": "first" }));
        log.record(json!({ "name": "second" }));
        log.record(json!({ "name": "third" }));

        assert_eq!(log.len(), 3);
        assert_eq!(log.get(0), Some(&json!({ "name": "third" })));
        assert_eq!(log.get(2), Some(&json!({ "name": "first" })));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut log = MessageLog::new();
        let payload = json!({ "name": "same" });

        log.record(payload.clone());
        log.record(payload);

        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_to_json_is_newest_first_array() {
        let mut log = MessageLog::new();
        log.record(json!(1));
        log.record(json!(2));

        assert_eq!(log.to_json(), json!([2, 1]));
    }
}
