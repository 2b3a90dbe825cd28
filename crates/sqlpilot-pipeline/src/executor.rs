//! Polled query execution.
//!
//! The engine offers no push notification, so execution is an explicit
//! submit → poll → terminal-state machine. Every iteration checks the
//! caller's cancellation token and the wall-clock deadline before polling;
//! tripping either yields an infrastructure failure rather than hanging.
//!
//! This function never returns `Err`: all failures, including transport
//! problems, are folded into [`ExecutionOutcome`] so the controller's flow
//! stays exception-free.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlpilot_core::{CancellationToken, ExecutionFailure, ExecutionOutcome, ResultSet};
use sqlpilot_services::{QueryEngine, QueryState};
use tracing::{debug, info, warn};

pub struct QueryExecutor {
    engine: Arc<dyn QueryEngine>,
    output_location: String,
    poll_interval: Duration,
    deadline: Duration,
}

impl QueryExecutor {
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        output_location: &str,
        poll_interval: Duration,
        deadline: Duration,
    ) -> Self {
        Self {
            engine,
            output_location: output_location.to_string(),
            poll_interval,
            deadline,
        }
    }

    /// Submit a statement and drive it to a terminal outcome.
    pub async fn execute(
        &self,
        database: &str,
        sql: &str,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let execution_id = match self
            .engine
            .start(sql, database, &self.output_location)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("query submission failed: {e}");
                return ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(e.to_string()));
            }
        };
        info!(%execution_id, %database, "query submitted");

        let started = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(
                    "execution cancelled before completion".to_string(),
                ));
            }
            if started.elapsed() >= self.deadline {
                return ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(format!(
                    "execution deadline of {:?} exceeded",
                    self.deadline
                )));
            }

            let status = match self.engine.poll(&execution_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(%execution_id, "status poll failed: {e}");
                    return ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(
                        e.to_string(),
                    ));
                }
            };

            match status.state {
                QueryState::Succeeded => return self.collect(&execution_id).await,
                QueryState::Failed | QueryState::Cancelled => {
                    let reason = status
                        .reason
                        .unwrap_or_else(|| "Unknown error".to_string());
                    info!(%execution_id, %reason, "query reached failed state");
                    return ExecutionOutcome::Failed(ExecutionFailure::Query(reason));
                }
                QueryState::Queued | QueryState::Running => {
                    debug!(%execution_id, state = ?status.state, "query still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn collect(&self, execution_id: &str) -> ExecutionOutcome {
        match self.engine.fetch_results(execution_id).await {
            Ok(raw) => {
                let result = ResultSet::from_raw(raw.columns, &raw.rows);
                info!(%execution_id, rows = result.rows.len(), "query succeeded");
                ExecutionOutcome::Succeeded(result)
            }
            Err(e) => {
                warn!(%execution_id, "result fetch failed: {e}");
                ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlpilot_services::{QueryStatus, RawResultSet, ServiceError};
    use std::sync::Mutex;

    /// Engine stub driven by a queue of poll states.
    struct StubEngine {
        poll_states: Mutex<Vec<QueryStatus>>,
        results: RawResultSet,
        fail_submission: bool,
    }

    impl StubEngine {
        fn with_polls(states: Vec<QueryStatus>) -> Self {
            Self {
                poll_states: Mutex::new(states),
                results: RawResultSet::default(),
                fail_submission: false,
            }
        }
    }

    #[async_trait]
    impl QueryEngine for StubEngine {
        async fn start(
            &self,
            _sql: &str,
            _database: &str,
            _output_location: &str,
        ) -> Result<String, ServiceError> {
            if self.fail_submission {
                return Err(ServiceError::Api {
                    status: 503,
                    detail: "engine unavailable".to_string(),
                });
            }
            Ok("exec-1".to_string())
        }

        async fn poll(&self, _execution_id: &str) -> Result<QueryStatus, ServiceError> {
            let mut states = self.poll_states.lock().unwrap();
            if states.is_empty() {
                // Keep reporting RUNNING once the script runs out.
                return Ok(QueryStatus {
                    state: QueryState::Running,
                    reason: None,
                });
            }
            Ok(states.remove(0))
        }

        async fn fetch_results(&self, _execution_id: &str) -> Result<RawResultSet, ServiceError> {
            Ok(self.results.clone())
        }
    }

    fn executor(engine: StubEngine) -> QueryExecutor {
        QueryExecutor::new(
            Arc::new(engine),
            "results://test/",
            Duration::from_millis(1),
            Duration::from_millis(250),
        )
    }

    #[tokio::test]
    async fn success_after_running_polls_parses_rows() {
        let mut engine = StubEngine::with_polls(vec![
            QueryStatus {
                state: QueryState::Running,
                reason: None,
            },
            QueryStatus {
                state: QueryState::Succeeded,
                reason: None,
            },
        ]);
        engine.results = RawResultSet {
            columns: vec!["region".to_string()],
            rows: vec![vec!["region".to_string()], vec!["west".to_string()]],
        };

        let outcome = executor(engine)
            .execute("sales_db", "SELECT region FROM orders", &CancellationToken::new())
            .await;

        match outcome {
            ExecutionOutcome::Succeeded(result) => {
                assert_eq!(result.rows.len(), 1);
                assert_eq!(result.rows[0]["region"], "west");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn header_only_result_yields_empty_rows() {
        let mut engine = StubEngine::with_polls(vec![QueryStatus {
            state: QueryState::Succeeded,
            reason: None,
        }]);
        engine.results = RawResultSet {
            columns: vec!["region".to_string()],
            rows: vec![vec!["region".to_string()]],
        };

        let outcome = executor(engine)
            .execute("sales_db", "SELECT region FROM orders WHERE 1=0", &CancellationToken::new())
            .await;

        match outcome {
            ExecutionOutcome::Succeeded(result) => assert!(result.is_empty()),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_state_carries_engine_reason_verbatim() {
        let engine = StubEngine::with_polls(vec![QueryStatus {
            state: QueryState::Failed,
            reason: Some("COLUMN_NOT_FOUND: cust_id".to_string()),
        }]);

        let outcome = executor(engine)
            .execute("sales_db", "SELECT cust_id FROM orders", &CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            ExecutionOutcome::Failed(ExecutionFailure::Query(
                "COLUMN_NOT_FOUND: cust_id".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn submission_failure_is_infrastructure_not_a_panic() {
        let mut engine = StubEngine::with_polls(vec![]);
        engine.fail_submission = true;

        let outcome = executor(engine)
            .execute("sales_db", "SELECT 1", &CancellationToken::new())
            .await;

        match outcome {
            ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(detail)) => {
                assert!(detail.contains("engine unavailable"));
            }
            other => panic!("expected infrastructure failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deadline_expiry_is_an_infrastructure_failure() {
        // Engine never leaves RUNNING; the 250ms deadline must trip.
        let engine = StubEngine::with_polls(vec![]);

        let outcome = executor(engine)
            .execute("sales_db", "SELECT sleep(forever)", &CancellationToken::new())
            .await;

        match outcome {
            ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(detail)) => {
                assert!(detail.contains("deadline"));
            }
            other => panic!("expected deadline failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_stops_the_poll_loop() {
        let engine = StubEngine::with_polls(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = executor(engine)
            .execute("sales_db", "SELECT 1", &cancel)
            .await;

        match outcome {
            ExecutionOutcome::Failed(ExecutionFailure::Infrastructure(detail)) => {
                assert!(detail.contains("cancelled"));
            }
            other => panic!("expected cancellation failure, got {other:?}"),
        }
    }
}
