//! Run summary and reporting

use crate::domain::CompositeKey;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The dataset was fully scanned
    CompletedExhausted,
    /// The row cap was reached before exhaustion
    CompletedCapReached,
    /// A fatal error or a shutdown signal stopped the run early
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::CompletedExhausted => "completed (dataset exhausted)",
            RunStatus::CompletedCapReached => "completed (row cap reached)",
            RunStatus::Aborted => "aborted",
        }
    }
}

/// Summary of one export run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Rows written to the sink (and flushed, even on abort)
    pub rows_exported: u64,
    /// Windows retrieved from the store
    pub windows: u64,
    pub duration: Duration,
    /// Last composite key emitted, as a resume hint
    pub last_cursor: Option<CompositeKey>,
}

impl RunSummary {
    /// Average throughput over the whole run
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.rows_exported as f64 / secs
    }

    pub fn log(&self) {
        tracing::info!(
            status = self.status.as_str(),
            rows_exported = self.rows_exported,
            windows = self.windows,
            duration_ms = self.duration.as_millis() as u64,
            rows_per_second = format!("{:.0}", self.rows_per_second()),
            last_cursor = self.last_cursor.as_ref().map(|c| c.to_string()),
            "Export finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_per_second() {
        let summary = RunSummary {
            status: RunStatus::CompletedExhausted,
            rows_exported: 1_000,
            windows: 1,
            duration: Duration::from_secs(4),
            last_cursor: None,
        };
        assert_eq!(summary.rows_per_second(), 250.0);
    }

    #[test]
    fn test_zero_duration_rate_is_zero() {
        let summary = RunSummary {
            status: RunStatus::Aborted,
            rows_exported: 10,
            windows: 1,
            duration: Duration::ZERO,
            last_cursor: None,
        };
        assert_eq!(summary.rows_per_second(), 0.0);
    }
}
