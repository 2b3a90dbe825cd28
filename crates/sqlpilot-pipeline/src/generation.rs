//! Prompt templates and generation calls.
//!
//! Every call is self-contained: the full prompt (question, schema block,
//! and on corrections the prior error) is rebuilt each time, and the model
//! endpoint keeps no conversation. Model failures propagate untouched;
//! there is no local fallback for a broken endpoint.

use std::sync::Arc;

use sqlpilot_core::DecodingConfig;
use sqlpilot_services::{ModelService, ServiceError};

/// Style guide embedded in every SQL generation prompt.
const SQL_RULES: &str = "It is important that the SQL query complies with the target engine's syntax.
- Use aliases if column names are the same during joins, e.g., llm.customer_id in SELECT statement.
- Enclose string values in quotes.
- Include all required columns when writing CTEs.
- Cast non-string columns to string when concatenating.";

fn extraction_prompt(question: &str) -> String {
    format!(
        "Extract main entities and metrics from the below question.\n\
         Question: \"{question}\"\n\
         Respond only with the entities and metrics and nothing else."
    )
}

fn sql_prompt(question: &str, schema_block: &str, prior_error: Option<&str>) -> String {
    match prior_error {
        Some(error) => format!(
            "You are a SQL expert. Review the error: {error}.\n\
             {SQL_RULES}\n\
             Generate a SQL statement for the following question:\n\
             \"{question}\"\n\
             Using the below SQL schema:\n\
             {schema_block}\n\
             Respond with only the SQL and nothing else."
        ),
        None => format!(
            "You are a SQL expert.\n\
             {SQL_RULES}\n\
             Generate a SQL statement for the following question:\n\
             \"{question}\"\n\
             Using the below SQL schema:\n\
             {schema_block}\n\
             Respond with only the SQL and nothing else."
        ),
    }
}

/// Thin wrapper over the model service with the pipeline's fixed templates.
#[derive(Clone)]
pub struct GenerationClient {
    model: Arc<dyn ModelService>,
}

impl GenerationClient {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self { model }
    }

    /// Reduce a question to a short entity/metric phrase.
    pub async fn extract_entities(&self, question: &str) -> Result<String, ServiceError> {
        self.model
            .invoke(&extraction_prompt(question), &DecodingConfig::deterministic())
            .await
    }

    /// Generate (or, with a prior error, correct) a SQL statement.
    ///
    /// The completion is returned verbatim apart from trimming: the
    /// templates demand SQL-only output, so no markdown stripping happens
    /// here.
    pub async fn generate_sql(
        &self,
        question: &str,
        schema_block: &str,
        prior_error: Option<&str>,
    ) -> Result<String, ServiceError> {
        self.model
            .invoke(
                &sql_prompt(question, schema_block, prior_error),
                &DecodingConfig::deterministic(),
            )
            .await
    }

    /// Open-ended text generation with the exploratory decoding preset.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, ServiceError> {
        self.model
            .invoke(prompt, &DecodingConfig::exploratory())
            .await
    }
}
