//! Process-lifetime analytics for search and answer requests.
//!
//! [`QueryLog`] is a fixed-capacity ring buffer shared by every request
//! handler; [`QueryLog::summarize`] aggregates whatever it currently holds.

mod query_log;
mod summary;

pub use query_log::AnalyticsConfig;
pub use query_log::LogEventType;
pub use query_log::QueryLog;
pub use query_log::QueryLogEntry;
pub use summary::AnalyticsSummary;
pub use summary::QueryCount;
pub use summary::normalize_query;
