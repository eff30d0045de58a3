//! Matching a just-triggered deploy to the pipeline execution it started.
//!
//! CodePipeline does not tell us which execution a Jenkins deploy caused.
//! The newest execution is taken as ours only if nothing else could be:
//! it must be in progress, must not predate tracking by
//! [`STALE_AFTER_SECS`] or more, and must be the only execution in progress.

use crate::api::{ExecutionStatus, ExecutionSummary};
use chrono::{DateTime, Utc};
use shipwatch_core::{Error, Result};

/// An in-progress execution that started this many seconds (or more) before
/// tracking began is assumed to belong to an earlier run.
pub const STALE_AFTER_SECS: i64 = 30;

/// Result of one correlation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    /// The new execution has not shown up yet.
    Waiting,
    /// This is the execution to follow.
    Matched(ExecutionSummary),
}

/// Decide which execution, if any, belongs to this run.
///
/// `executions` is newest first, as `ListPipelineExecutions` returns it.
///
/// # Errors
///
/// Returns [`Error::StaleExecution`] when the newest in-progress execution
/// started too long before `poll_started_at`, and
/// [`Error::AmbiguousExecution`] when more than one execution is in progress.
pub fn correlate(
    pipeline: &str,
    executions: &[ExecutionSummary],
    poll_started_at: DateTime<Utc>,
) -> Result<Correlation> {
    let Some(newest) = executions.first() else {
        return Ok(Correlation::Waiting);
    };
    if newest.status != ExecutionStatus::InProgress {
        return Ok(Correlation::Waiting);
    }
    // Listed before CodePipeline filled in the start time.
    let Some(started_at) = newest.started_at else {
        return Ok(Correlation::Waiting);
    };

    let age_secs = (poll_started_at - started_at).num_seconds();
    if age_secs >= STALE_AFTER_SECS {
        return Err(Error::StaleExecution {
            pipeline: pipeline.to_string(),
            execution_id: newest.execution_id.clone(),
            age_secs,
        });
    }

    let in_progress = executions
        .iter()
        .filter(|e| e.status == ExecutionStatus::InProgress)
        .count();
    if in_progress > 1 {
        return Err(Error::AmbiguousExecution {
            pipeline: pipeline.to_string(),
            in_progress,
        });
    }

    Ok(Correlation::Matched(newest.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const PIPELINE: &str = "MailAccounts-pipeline-qa-Pipeline";

    fn poll_start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-02T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn execution(id: &str, status: ExecutionStatus, offset_secs: i64) -> ExecutionSummary {
        ExecutionSummary {
            execution_id: id.to_string(),
            status,
            started_at: Some(poll_start() + TimeDelta::seconds(offset_secs)),
        }
    }

    #[test]
    fn test_empty_list_waits() {
        assert_eq!(
            correlate(PIPELINE, &[], poll_start()).unwrap(),
            Correlation::Waiting
        );
    }

    #[test]
    fn test_newest_not_in_progress_waits() {
        let executions = [
            execution("prev", ExecutionStatus::Succeeded, -600),
            execution("older", ExecutionStatus::Failed, -1200),
        ];
        assert_eq!(
            correlate(PIPELINE, &executions, poll_start()).unwrap(),
            Correlation::Waiting
        );
    }

    #[test]
    fn test_missing_start_time_waits() {
        let executions = [ExecutionSummary {
            execution_id: "new".to_string(),
            status: ExecutionStatus::InProgress,
            started_at: None,
        }];
        assert_eq!(
            correlate(PIPELINE, &executions, poll_start()).unwrap(),
            Correlation::Waiting
        );
    }

    #[test]
    fn test_fresh_single_execution_matches() {
        let executions = [
            execution("new", ExecutionStatus::InProgress, 95),
            execution("prev", ExecutionStatus::Succeeded, -600),
        ];
        let Correlation::Matched(matched) = correlate(PIPELINE, &executions, poll_start()).unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(matched.execution_id, "new");
    }

    #[test]
    fn test_started_shortly_before_poll_matches() {
        let executions = [execution("new", ExecutionStatus::InProgress, -29)];
        assert!(matches!(
            correlate(PIPELINE, &executions, poll_start()).unwrap(),
            Correlation::Matched(_)
        ));
    }

    #[test]
    fn test_stale_execution_rejected() {
        let executions = [execution("old-run", ExecutionStatus::InProgress, -31)];
        let err = correlate(PIPELINE, &executions, poll_start()).unwrap_err();
        assert!(matches!(
            err,
            Error::StaleExecution { ref execution_id, age_secs: 31, .. } if execution_id == "old-run"
        ));
    }

    #[test]
    fn test_exactly_thirty_seconds_is_stale() {
        let executions = [execution("old-run", ExecutionStatus::InProgress, -30)];
        assert!(correlate(PIPELINE, &executions, poll_start()).is_err());
    }

    #[test]
    fn test_two_in_progress_rejected() {
        let executions = [
            execution("a", ExecutionStatus::InProgress, 10),
            execution("b", ExecutionStatus::InProgress, 5),
            execution("c", ExecutionStatus::Succeeded, -600),
        ];
        let err = correlate(PIPELINE, &executions, poll_start()).unwrap_err();
        assert!(matches!(err, Error::AmbiguousExecution { in_progress: 2, .. }));
    }

    #[test]
    fn test_in_progress_further_down_the_list_is_ambiguous() {
        let executions = [
            execution("a", ExecutionStatus::InProgress, 10),
            execution("b", ExecutionStatus::Stopped, -100),
            execution("c", ExecutionStatus::InProgress, -900),
        ];
        assert!(matches!(
            correlate(PIPELINE, &executions, poll_start()).unwrap_err(),
            Error::AmbiguousExecution { .. }
        ));
    }

    #[test]
    fn test_stale_checked_before_ambiguity() {
        let executions = [
            execution("a", ExecutionStatus::InProgress, -300),
            execution("b", ExecutionStatus::InProgress, -400),
        ];
        assert!(matches!(
            correlate(PIPELINE, &executions, poll_start()).unwrap_err(),
            Error::StaleExecution { .. }
        ));
    }
}
