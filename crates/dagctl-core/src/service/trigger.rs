//! Triggering new runs of a DAG.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use dagctl_types::error::ControlError;
use dagctl_types::execution_date::parse_execution_date;
use dagctl_types::run::{RunState, StepInstance, TriggerRequest, WorkflowRun};
use uuid::Uuid;

use crate::repository::dag::DagRegistry;
use crate::repository::run::RunRepository;

/// Creates externally triggered runs.
pub struct TriggerService<D: DagRegistry, R: RunRepository> {
    registry: D,
    runs: R,
    /// Source of the implicit execution date.
    clock: fn() -> NaiveDateTime,
}

impl<D: DagRegistry, R: RunRepository> TriggerService<D, R> {
    pub fn new(registry: D, runs: R) -> Self {
        Self::with_clock(registry, runs, utc_now)
    }

    /// Like `new`, reading the current instant from `clock`.
    pub fn with_clock(registry: D, runs: R, clock: fn() -> NaiveDateTime) -> Self {
        Self {
            registry,
            runs,
            clock,
        }
    }

    /// Create a new run of `dag_id`.
    ///
    /// The execution date is validated before the registry is consulted, so
    /// a malformed date is reported even for an unknown DAG. The run is
    /// stored together with one pending instance per step.
    pub async fn trigger(
        &self,
        dag_id: &str,
        request: TriggerRequest,
    ) -> Result<WorkflowRun, ControlError> {
        let requested_date = request
            .execution_date
            .as_deref()
            .map(parse_execution_date)
            .transpose()?;

        let def = self
            .registry
            .get_dag(dag_id)
            .await?
            .ok_or_else(|| ControlError::DagNotFound(dag_id.to_string()))?;

        let now = (self.clock)();
        let execution_date = requested_date.unwrap_or(now);
        let run_id = match request.run_id {
            Some(run_id) if !run_id.is_empty() => run_id,
            _ => self.runs.synthesize_run_id(&execution_date),
        };

        let run = WorkflowRun {
            id: Uuid::now_v7(),
            dag_id: def.dag_id.clone(),
            run_id,
            execution_date,
            state: RunState::Running,
            start_date: Some(now),
            end_date: None,
            external_trigger: true,
            conf: request.conf,
        };

        let instances: Vec<StepInstance> = def
            .tasks
            .iter()
            .map(|step| {
                StepInstance::pending(
                    &def.dag_id,
                    &step.task_id,
                    execution_date,
                    &step.operator,
                    step.pool.clone(),
                )
            })
            .collect();

        self.runs.create_run(&run, &instances).await?;

        tracing::info!(
            dag_id = %run.dag_id,
            run_id = %run.run_id,
            execution_date = %run.execution_date,
            tasks = instances.len(),
            "run created"
        );

        Ok(run)
    }
}

/// Current UTC instant at microsecond precision.
fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::service::testing::{MockRegistry, MockRuns};
    use dagctl_types::execution_date::EXAMPLE_EXECUTION_DATE;
    use serde_json::json;

    fn service() -> TriggerService<MockRegistry, MockRuns> {
        TriggerService::new(MockRegistry::with_etl(), MockRuns::default())
    }

    fn at(date: &str) -> TriggerRequest {
        TriggerRequest {
            execution_date: Some(date.to_string()),
            ..TriggerRequest::default()
        }
    }

    #[tokio::test]
    async fn test_trigger_at_explicit_date() {
        let svc = service();
        let run = svc
            .trigger(
                "etl_daily",
                TriggerRequest {
                    conf: Some(json!({"k": [1, 2]})),
                    ..at("2024-01-01T00:00:00")
                },
            )
            .await
            .unwrap();

        assert_eq!(run.run_id, "manual__2024-01-01T00:00:00");
        assert_eq!(run.state, RunState::Running);
        assert!(run.external_trigger);
        assert!(run.start_date.is_some());
        assert_eq!(run.conf, Some(json!({"k": [1, 2]})));
        assert_eq!(
            run.to_string(),
            "<DagRun etl_daily @ 2024-01-01 00:00:00: manual__2024-01-01T00:00:00, externally triggered: true>"
        );

        let stored = svc.runs.stored();
        assert_eq!(stored.len(), 1);
        let task_ids: Vec<_> = stored[0].1.iter().map(|i| i.task_id.as_str()).collect();
        assert_eq!(task_ids, vec!["extract", "load"]);
        assert!(stored[0].1.iter().all(|i| i.state.is_none() && i.try_number == 0));
    }

    #[tokio::test]
    async fn test_trigger_with_run_id() {
        let svc = service();
        let run = svc
            .trigger(
                "etl_daily",
                TriggerRequest {
                    run_id: Some("backfill_1".to_string()),
                    ..at("2024-01-01T00:00:00")
                },
            )
            .await
            .unwrap();
        assert_eq!(run.run_id, "backfill_1");
    }

    #[tokio::test]
    async fn test_trigger_defaults_date_to_now() {
        let svc = service();
        let before = Utc::now().naive_utc() - chrono::Duration::seconds(1);
        let run = svc
            .trigger("etl_daily", TriggerRequest::default())
            .await
            .unwrap();

        assert!(run.execution_date >= before);
        assert_eq!(run.execution_date.and_utc().timestamp_subsec_nanos() % 1_000, 0);
        assert!(run.run_id.starts_with("manual__"));
        assert_eq!(run.start_date, Some(run.execution_date));
    }

    #[tokio::test]
    async fn test_back_to_back_dateless_triggers_create_distinct_runs() {
        let svc = service();
        let first = svc
            .trigger("etl_daily", TriggerRequest::default())
            .await
            .unwrap();
        // Step past the microsecond the first run was stamped with.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = svc
            .trigger("etl_daily", TriggerRequest::default())
            .await
            .unwrap();

        assert_ne!(first.execution_date, second.execution_date);
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(svc.runs.stored().len(), 2);
    }

    #[tokio::test]
    async fn test_dateless_triggers_at_same_instant_conflict() {
        fn frozen() -> NaiveDateTime {
            parse_execution_date("2024-06-01T12:00:00").unwrap()
        }
        let svc = TriggerService::with_clock(MockRegistry::with_etl(), MockRuns::default(), frozen);

        let first = svc
            .trigger("etl_daily", TriggerRequest::default())
            .await
            .unwrap();
        assert_eq!(first.run_id, "manual__2024-06-01T12:00:00");

        let err = svc
            .trigger("etl_daily", TriggerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::DuplicateRun(_)));
        assert_eq!(svc.runs.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_date_checked_before_registry() {
        let svc = service();
        let err = svc
            .trigger("no_such_dag", at("2024-01-01"))
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::InvalidExecutionDate(_)));
        assert_eq!(
            err.to_string(),
            format!(
                "Given execution date, 2024-01-01, could not be identified as a date. Example date format: {EXAMPLE_EXECUTION_DATE}"
            )
        );
        assert_eq!(svc.registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_dag() {
        let err = service()
            .trigger("missing", at("2024-01-01T00:00:00"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Dag id missing not found");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_date_is_rejected() {
        let svc = service();
        svc.trigger("etl_daily", at("2024-01-01T00:00:00"))
            .await
            .unwrap();

        let err = svc
            .trigger(
                "etl_daily",
                TriggerRequest {
                    run_id: Some("other".to_string()),
                    ..at("2024-01-01T00:00:00")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::DuplicateRun(_)));
        assert_eq!(svc.runs.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_run_id_is_rejected() {
        let svc = service();
        let with_id = |date: &str| TriggerRequest {
            run_id: Some("nightly".to_string()),
            ..at(date)
        };
        svc.trigger("etl_daily", with_id("2024-01-01T00:00:00"))
            .await
            .unwrap();

        let err = svc
            .trigger("etl_daily", with_id("2024-01-02T00:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::DuplicateRun(msg) if msg.contains("nightly")));
    }

    #[tokio::test]
    async fn test_storage_failure() {
        let svc = TriggerService::new(MockRegistry::with_etl(), MockRuns::failing());
        let err = svc
            .trigger("etl_daily", at("2024-01-01T00:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Storage(_)));
    }
}
