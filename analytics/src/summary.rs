use crate::query_log::LogEventType;
use crate::query_log::QueryLogEntry;
use indexmap::IndexMap;
use serde::Serialize;

const TOP_QUERIES: usize = 10;
const RECENT_ENTRIES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
}

/// Aggregate view over the entries currently held by a
/// [`QueryLog`](crate::QueryLog)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_count: usize,
    /// Every event type, zero counts included
    pub count_by_type: IndexMap<LogEventType, usize>,
    /// Mean elapsed time in milliseconds, 0 for an empty log
    pub average_elapsed_ms: f64,
    /// Most frequent normalized queries; equal counts keep first-appearance order
    pub top_queries: Vec<QueryCount>,
    /// Newest first
    pub recent: Vec<QueryLogEntry>,
}

impl AnalyticsSummary {
    pub(crate) fn from_entries<'a, I>(entries: I) -> Self
    where
        I: DoubleEndedIterator<Item = &'a QueryLogEntry> + Clone,
    {
        let mut count_by_type: IndexMap<LogEventType, usize> = [
            LogEventType::Search,
            LogEventType::Ask,
            LogEventType::AskStream,
        ]
        .into_iter()
        .map(|event_type| (event_type, 0))
        .collect();

        let mut frequencies: IndexMap<String, usize> = IndexMap::new();
        let mut total_count = 0;
        let mut total_elapsed = 0.0;

        for entry in entries.clone() {
            total_count += 1;
            total_elapsed += entry.elapsed_ms;
            *count_by_type.entry(entry.event_type).or_insert(0) += 1;
            *frequencies.entry(normalize_query(&entry.query)).or_insert(0) += 1;
        }

        let mut top_queries: Vec<QueryCount> = frequencies
            .into_iter()
            .map(|(query, count)| QueryCount { query, count })
            .collect();
        top_queries.sort_by(|a, b| b.count.cmp(&a.count));
        top_queries.truncate(TOP_QUERIES);

        let average_elapsed_ms = if total_count == 0 {
            0.0
        } else {
            ((total_elapsed / total_count as f64) * 100.0).round() / 100.0
        };

        Self {
            total_count,
            count_by_type,
            average_elapsed_ms,
            top_queries,
            recent: entries.rev().take(RECENT_ENTRIES).cloned().collect(),
        }
    }
}

/// Trimmed, lower-cased form used to group equivalent queries.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}
