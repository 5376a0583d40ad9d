//! Step tracking for setup runs.
//!
//! Every named operation a setup performs is recorded here so the run can
//! be summarized afterwards. Records are append-only and live only for the
//! current process; nothing is persisted across runs.

use chrono::{DateTime, Utc};

use crate::error::{Result, RigupError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    Succeeded,
    Failed,
}

/// Outcome of one named operation within a setup run.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    fn open(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Running,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == StepStatus::Running
    }

    /// Wall-clock duration of the step in whole seconds, if finished.
    pub fn elapsed_secs(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}

/// Aggregate view of a run, returned by [`StepTracker::summary`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records: Vec<StepRecord>,
}

/// Ordered record of every step in one setup run.
#[derive(Debug, Default)]
pub struct StepTracker {
    records: Vec<StepRecord>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a record for `name`. A name may repeat across the run, but two
    /// records with the same name must not be open at the same time.
    pub fn start(&mut self, name: &str) -> Result<()> {
        if self.records.iter().any(|r| r.name == name && r.is_open()) {
            return Err(RigupError::Config(format!(
                "step '{name}' is already running"
            )));
        }
        self.records.push(StepRecord::open(name));
        Ok(())
    }

    /// Close the most recently opened record matching `name`.
    pub fn end(&mut self, name: &str, success: bool, message: Option<String>) {
        let record = self
            .records
            .iter_mut()
            .rev()
            .find(|r| r.name == name && r.is_open());

        match record {
            Some(record) => {
                record.status = if success {
                    StepStatus::Succeeded
                } else {
                    StepStatus::Failed
                };
                record.error = message;
                record.ended_at = Some(Utc::now());
            }
            None => tracing::warn!("no running step named '{}' to end", name),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let succeeded = self
            .records
            .iter()
            .filter(|r| r.status == StepStatus::Succeeded)
            .count();
        let failed = self
            .records
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .count();

        RunSummary {
            total: self.records.len(),
            succeeded,
            failed,
            records: self.records.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_end_counts() {
        let mut tracker = StepTracker::new();
        tracker.start("a").unwrap();
        tracker.end("a", true, None);
        tracker.start("b").unwrap();
        tracker.end("b", false, Some("boom".to_string()));
        tracker.start("c").unwrap();
        tracker.end("c", true, None);

        let summary = tracker.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total, summary.succeeded + summary.failed);
    }

    #[test]
    fn test_start_rejects_open_duplicate() {
        let mut tracker = StepTracker::new();
        tracker.start("install").unwrap();
        assert!(tracker.start("install").is_err());

        // Once closed, the same name can be started again.
        tracker.end("install", true, None);
        assert!(tracker.start("install").is_ok());
    }

    #[test]
    fn test_end_closes_most_recent_match() {
        let mut tracker = StepTracker::new();
        tracker.start("x").unwrap();
        tracker.end("x", true, None);
        tracker.start("x").unwrap();
        tracker.end("x", false, Some("second run".to_string()));

        let records = tracker.summary().records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, StepStatus::Succeeded);
        assert_eq!(records[1].status, StepStatus::Failed);
        assert_eq!(records[1].error.as_deref(), Some("second run"));
    }

    #[test]
    fn test_end_without_start_is_ignored() {
        let mut tracker = StepTracker::new();
        tracker.end("ghost", true, None);
        assert_eq!(tracker.summary().total, 0);
    }

    #[test]
    fn test_records_preserve_order() {
        let mut tracker = StepTracker::new();
        for name in ["platform_check", "install", "verify"] {
            tracker.start(name).unwrap();
            tracker.end(name, true, None);
        }

        let names: Vec<String> = tracker
            .summary()
            .records
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["platform_check", "install", "verify"]);
    }

    #[test]
    fn test_open_record_has_no_end_timestamp() {
        let mut tracker = StepTracker::new();
        tracker.start("pending").unwrap();

        let records = tracker.summary().records;
        assert_eq!(records[0].status, StepStatus::Running);
        assert!(records[0].ended_at.is_none());
        assert!(records[0].elapsed_secs().is_none());
    }
}
