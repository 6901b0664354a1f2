use crate::executor::{ExecutionResult, ExecutionStatus};
use crate::input::TestCase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Outcome of one completed target run, as it appears in the report.
/// The exact input text and its hash are kept so a finding can be reproduced
/// and deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub test_input: String,
    pub input_hash: String,
    pub crash: bool,
    pub failure: Option<String>,
    pub duration_secs: f64,
}

impl RunRecord {
    pub fn new(case: TestCase, result: &ExecutionResult) -> Self {
        let failure = match &result.status {
            ExecutionStatus::Ok => None,
            ExecutionStatus::TargetFailure(desc) => Some(desc.clone()),
            ExecutionStatus::Timeout => Some("timed out".to_string()),
        };
        let input_hash = format!("{:x}", md5::compute(case.as_bytes()));
        Self {
            test_input: case.into_string(),
            input_hash,
            crash: result.is_failure(),
            failure,
            duration_secs: result.duration.as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_tests: usize,
    pub total_crashes: usize,
    pub total_time_secs: f64,
    pub timestamp: DateTime<Utc>,
}

/// All records of one fuzzing run. The timestamp is fixed at creation.
#[derive(Debug, Serialize)]
pub struct FuzzReport {
    pub results: Vec<RunRecord>,
    pub timestamp: DateTime<Utc>,
}

impl FuzzReport {
    pub fn new(results: Vec<RunRecord>) -> Self {
        Self {
            results,
            timestamp: Utc::now(),
        }
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            total_tests: self.results.len(),
            total_crashes: self.results.iter().filter(|r| r.crash).count(),
            total_time_secs: self.results.iter().map(|r| r.duration_secs).sum(),
            timestamp: self.timestamp,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&serde_json::json!({
            "summary": self.summary(),
            "detailed_results": self.results,
        }))
    }

    pub fn save(&self, path: &Path) -> Result<(), anyhow::Error> {
        let rendered = self.to_json()?;
        std::fs::write(path, rendered)
            .map_err(|e| anyhow::anyhow!("failed to write report to {:?}: {}", path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(input: &str, crash: bool, duration_secs: f64) -> RunRecord {
        RunRecord {
            test_input: input.to_string(),
            input_hash: format!("{:x}", md5::compute(input.as_bytes())),
            crash,
            failure: crash.then(|| "exited with code 1".to_string()),
            duration_secs,
        }
    }

    #[test]
    fn summary_aggregates_counts_and_durations() {
        let report = FuzzReport::new(vec![
            record("input1", true, 0.5),
            record("input2", false, 0.2),
            record("input3", true, 0.4),
        ]);
        let summary = report.summary();

        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.total_crashes, 2);
        assert!((summary.total_time_secs - 1.1).abs() < 1e-9);
        assert_eq!(summary.timestamp, report.timestamp);
    }

    #[test]
    fn empty_report_has_zeroed_summary() {
        let summary = FuzzReport::new(Vec::new()).summary();
        assert_eq!(summary.total_tests, 0);
        assert_eq!(summary.total_crashes, 0);
        assert_eq!(summary.total_time_secs, 0.0);
    }

    #[test]
    fn json_rendering_nests_summary_and_results() {
        let report = FuzzReport::new(vec![record("abc", true, 0.1)]);
        let rendered = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["summary"]["total_tests"], 1);
        assert_eq!(value["summary"]["total_crashes"], 1);
        assert_eq!(value["detailed_results"][0]["test_input"], "abc");
        assert_eq!(value["detailed_results"][0]["crash"], true);
        assert_eq!(
            value["detailed_results"][0]["input_hash"],
            format!("{:x}", md5::compute(b"abc"))
        );
    }

    #[test]
    fn run_record_carries_failure_description() {
        let result = ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(1),
            signal: None,
            status: ExecutionStatus::TargetFailure("exited with code 1".to_string()),
            duration: Duration::from_millis(250),
            artifact: None,
        };
        let rec = RunRecord::new(TestCase::new("boom"), &result);

        assert!(rec.crash);
        assert_eq!(rec.failure.as_deref(), Some("exited with code 1"));
        assert_eq!(rec.test_input, "boom");
        assert!((rec.duration_secs - 0.25).abs() < 1e-9);
    }
}
