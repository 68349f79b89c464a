use crate::summary::AnalyticsSummary;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

/// Kind of request that produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogEventType {
    #[serde(rename = "search")]
    Search,
    #[serde(rename = "ask")]
    Ask,
    #[serde(rename = "ask-stream")]
    AskStream,
}

impl LogEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogEventType::Search => "search",
            LogEventType::Ask => "ask",
            LogEventType::AskStream => "ask-stream",
        }
    }
}

impl fmt::Display for LogEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    #[serde(rename = "type")]
    pub event_type: LogEventType,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Maximum number of retained entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    500
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("analytics capacity must be > 0".to_string());
        }
        Ok(())
    }
}

/// Bounded FIFO log of completed requests.
///
/// Appends and evictions happen under one mutex, so concurrent handlers may
/// share a single instance behind an `Arc`.
#[derive(Debug)]
pub struct QueryLog {
    entries: Mutex<VecDeque<QueryLogEntry>>,
    capacity: usize,
}

impl QueryLog {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, event_type: LogEventType, query: &str, elapsed_ms: f64) {
        self.push(QueryLogEntry {
            event_type,
            query: query.to_string(),
            timestamp: Utc::now(),
            elapsed_ms,
        });
    }

    pub fn push(&self, entry: QueryLogEntry) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        log::trace!("Query log holds {} entries", entries.len());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<QueryLogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn summarize(&self) -> AnalyticsSummary {
        AnalyticsSummary::from_entries(self.lock().iter())
    }

    // A panic while holding the lock cannot leave the deque half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<QueryLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let capacity = 5;
        let k = 3;
        let log = QueryLog::new(capacity);

        for i in 0..capacity + k {
            log.record(LogEventType::Search, &format!("q{i}"), i as f64);
        }

        let queries: Vec<_> = log.entries().into_iter().map(|e| e.query).collect();
        assert_eq!(log.len(), capacity);
        assert_eq!(queries, vec!["q3", "q4", "q5", "q6", "q7"]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let log = QueryLog::new(0);
        log.record(LogEventType::Ask, "a", 1.0);
        log.record(LogEventType::Ask, "b", 1.0);
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.entries()[0].query, "b");
    }

    #[test]
    fn test_event_type_wire_names() {
        let entry = QueryLogEntry {
            event_type: LogEventType::AskStream,
            query: "q".to_string(),
            timestamp: Utc::now(),
            elapsed_ms: 1.5,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "ask-stream");
        assert_eq!(LogEventType::Search.to_string(), "search");
    }

    #[test]
    fn test_config_validation() {
        assert!(AnalyticsConfig::default().validate().is_ok());
        assert!(AnalyticsConfig { capacity: 0 }.validate().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_serialized() {
        let log = Arc::new(QueryLog::new(1000));
        let mut handles = Vec::new();
        for worker in 0..8 {
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    log.record(LogEventType::Search, &format!("w{worker}-{i}"), 1.0);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(log.len(), 400);
        assert_eq!(log.summarize().total_count, 400);
    }
}
