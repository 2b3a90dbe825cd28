//! Execution outcomes and the terminal pipeline result.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Parsed tabular result of a successful execution. All values are textual;
/// the pipeline performs no type coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl ResultSet {
    /// Build a result set from the engine's raw rows, where the first row is
    /// a header naming the columns. A header-only result yields zero rows.
    pub fn from_raw(columns: Vec<String>, raw_rows: &[Vec<String>]) -> Self {
        let rows = raw_rows
            .iter()
            .skip(1)
            .map(|row| {
                columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<HashMap<_, _>>()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Why an execution did not succeed.
///
/// The distinction drives the correction loop: a `Query` failure carries an
/// engine-supplied reason the model can act on, while an `Infrastructure`
/// failure cannot be fixed by changing the SQL text (it is still retried,
/// within the same budget).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionFailure {
    /// The engine reached a terminal FAILED or CANCELLED state.
    Query(String),
    /// Transport or client failure while talking to the engine.
    Infrastructure(String),
}

impl ExecutionFailure {
    pub fn detail(&self) -> &str {
        match self {
            ExecutionFailure::Query(reason) => reason,
            ExecutionFailure::Infrastructure(detail) => detail,
        }
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionFailure::Query(reason) => write!(f, "query failed: {reason}"),
            ExecutionFailure::Infrastructure(detail) => {
                write!(f, "infrastructure error: {detail}")
            }
        }
    }
}

/// Terminal outcome of one SQL execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Succeeded(ResultSet),
    Failed(ExecutionFailure),
}

impl ExecutionOutcome {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded(_))
    }
}

/// One issued SQL statement. Attempts are immutable once recorded; a
/// correction produces a new attempt rather than rewriting a prior one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlAttempt {
    pub query_text: String,
    pub database_name: String,
    pub schema_context: String,
    /// 1-based position in the run's attempt sequence.
    pub attempt_index: u32,
}

/// Why a run ended without a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// No usable schema context could be established. Consumes no execution
    /// budget.
    Grounding(String),
    /// The model failed or returned an empty completion.
    Generation(String),
    /// The retry budget is exhausted; carries the final failure verbatim.
    Execution {
        attempts: u32,
        failure: ExecutionFailure,
    },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Grounding(detail) => write!(f, "grounding failed: {detail}"),
            AbortReason::Generation(detail) => write!(f, "generation failed: {detail}"),
            AbortReason::Execution { attempts, failure } => {
                write!(f, "aborted after {attempts} execution attempts: {failure}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineOutcome {
    Succeeded(ResultSet),
    Aborted(AbortReason),
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// The last generated SQL text; `None` only when no statement was ever
    /// produced (grounding or first-generation failure).
    pub sql: Option<String>,
    /// Number of executions performed against the engine.
    pub executions: u32,
    /// Every statement issued during the run, in order.
    pub attempts: Vec<SqlAttempt>,
    pub outcome: PipelineOutcome,
}

impl PipelineResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Succeeded(_))
    }

    pub fn aborted(sql: Option<String>, executions: u32, attempts: Vec<SqlAttempt>, reason: AbortReason) -> Self {
        Self {
            sql,
            executions,
            attempts,
            outcome: PipelineOutcome::Aborted(reason),
        }
    }
}
