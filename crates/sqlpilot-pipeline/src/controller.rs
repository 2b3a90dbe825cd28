//! The correction loop controller.
//!
//! Drives GROUNDING → GENERATING → EXECUTING and, on a failed execution,
//! CORRECTING back into GENERATING with the engine's error embedded in the
//! next prompt. Grounding happens exactly once per run; correction cycles
//! reuse the database name and schema block established up front, so the
//! model sees a stable schema across the whole attempt sequence.

use std::time::Duration;

use sqlpilot_core::{
    AbortReason, CancellationToken, ExecutionOutcome, PipelineOutcome, PipelineResult,
    SchemaContext, SqlAttempt,
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::context::PipelineContext;
use crate::executor::QueryExecutor;
use crate::generation::GenerationClient;
use crate::grounding::GroundingRetriever;
use crate::schema_catalog::SchemaCatalog;

/// One self-correcting natural-language-to-SQL run, from question to
/// terminal result.
///
/// A pipeline holds no per-run state; concurrent `run` calls are
/// independent and the shared service handles are expected to be safe for
/// concurrent use.
pub struct Pipeline {
    catalog: SchemaCatalog,
    grounding: GroundingRetriever,
    generation: GenerationClient,
    executor: QueryExecutor,
    retry_max: u32,
}

impl Pipeline {
    pub fn new(ctx: &PipelineContext) -> Self {
        let generation = GenerationClient::new(ctx.model.clone());
        Self {
            catalog: SchemaCatalog::new(ctx.catalog.clone()),
            grounding: GroundingRetriever::new(generation.clone(), ctx.knowledge_base.clone()),
            generation,
            executor: QueryExecutor::new(
                ctx.engine.clone(),
                &ctx.config.engine.output_location,
                Duration::from_secs(ctx.config.engine.poll_interval_secs),
                Duration::from_secs(ctx.config.engine.deadline_secs),
            ),
            // A zero budget would never execute anything.
            retry_max: ctx.config.retry.max_attempts.max(1),
        }
    }

    /// Run the pipeline to a terminal result.
    pub async fn run(&self, question: &str, database_hint: Option<&str>) -> PipelineResult {
        self.run_with_cancel(question, database_hint, &CancellationToken::new())
            .await
    }

    /// Like [`Pipeline::run`], with a caller-held cancellation token that is
    /// honored between poll iterations of the executor.
    pub async fn run_with_cancel(
        &self,
        question: &str,
        database_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id);
        self.drive(question, database_hint, cancel)
            .instrument(span)
            .await
    }

    async fn drive(
        &self,
        question: &str,
        database_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        // GROUNDING: once per run. Correction cycles below reuse this.
        let (database, context) = match self.establish_context(question, database_hint).await {
            Ok(grounded) => grounded,
            Err(reason) => {
                warn!(%reason, "aborting before any execution");
                return PipelineResult::aborted(None, 0, Vec::new(), reason);
            }
        };
        let schema_block = context.to_prompt_block();
        info!(%database, tables = context.tables.len(), "schema context established");

        let mut attempts: Vec<SqlAttempt> = Vec::new();
        let mut executions = 0u32;
        let mut last_error: Option<String> = None;

        loop {
            // GENERATING: base template first, correction template after a
            // failure.
            let sql = match self
                .generation
                .generate_sql(question, &schema_block, last_error.as_deref())
                .await
            {
                Ok(sql) => sql,
                Err(e) => {
                    return PipelineResult::aborted(
                        attempts.last().map(|a| a.query_text.clone()),
                        executions,
                        attempts,
                        AbortReason::Generation(e.to_string()),
                    );
                }
            };
            if sql.is_empty() {
                return PipelineResult::aborted(
                    attempts.last().map(|a| a.query_text.clone()),
                    executions,
                    attempts,
                    AbortReason::Generation("model returned an empty completion".to_string()),
                );
            }

            attempts.push(SqlAttempt {
                query_text: sql.clone(),
                database_name: database.clone(),
                schema_context: schema_block.clone(),
                attempt_index: attempts.len() as u32 + 1,
            });
            info!(attempt = attempts.len(), %sql, "executing statement");

            // EXECUTING: exactly one execution per generated statement.
            let outcome = self.executor.execute(&database, &sql, cancel).await;
            executions += 1;

            match outcome {
                ExecutionOutcome::Succeeded(rows) => {
                    return PipelineResult {
                        sql: Some(sql),
                        executions,
                        attempts,
                        outcome: PipelineOutcome::Succeeded(rows),
                    };
                }
                ExecutionOutcome::Failed(failure) => {
                    warn!(%failure, executions, "execution attempt failed");
                    if executions >= self.retry_max {
                        return PipelineResult::aborted(
                            Some(sql),
                            executions,
                            attempts,
                            AbortReason::Execution {
                                attempts: executions,
                                failure,
                            },
                        );
                    }
                    // CORRECTING: seed the next generation with the error.
                    last_error = Some(format!(
                        "Generated SQL query: {sql} produced the following error: {}",
                        failure.detail()
                    ));
                }
            }
        }
    }

    /// Establish the database name and schema context for a run.
    ///
    /// With a database hint the catalog is authoritative; otherwise the
    /// question is grounded through the knowledge base. The two strategies
    /// are never mixed within a run.
    async fn establish_context(
        &self,
        question: &str,
        database_hint: Option<&str>,
    ) -> Result<(String, SchemaContext), AbortReason> {
        match database_hint {
            Some(database) => match self.catalog.fetch_schema(database).await {
                Ok(tables) if !tables.is_empty() => {
                    Ok((database.to_string(), SchemaContext::new(tables)))
                }
                Ok(_) => Err(AbortReason::Grounding(format!(
                    "catalog lists no tables for database '{database}'"
                ))),
                Err(e) => Err(AbortReason::Grounding(format!(
                    "catalog lookup failed for database '{database}': {e}"
                ))),
            },
            None => match self.grounding.ground(question).await {
                Ok(grounded) => Ok((grounded.database, grounded.context)),
                Err(e) => Err(AbortReason::Grounding(e.to_string())),
            },
        }
    }
}
