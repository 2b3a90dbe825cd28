//! Configuration for the SQLPilot pipeline.
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (endpoints, retry budget, logging)
//! 2. .env file - secrets (model API key)
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Base URLs of the four collaborator services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub catalog_url: String,
    pub model_url: String,
    pub knowledge_base_url: String,
    pub engine_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            catalog_url: "http://localhost:9021".to_string(),
            model_url: "http://localhost:9022".to_string(),
            knowledge_base_url: "http://localhost:9023".to_string(),
            engine_url: "http://localhost:9024".to_string(),
        }
    }
}

/// Model and knowledge-base identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_id: String,
    pub knowledge_base_id: String,
    /// Model reference passed to the retrieval service.
    pub model_ref: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: "text-model-v2".to_string(),
            knowledge_base_id: "table-schemas".to_string(),
            model_ref: "text-model-v2".to_string(),
        }
    }
}

/// Query engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the engine writes result artifacts.
    pub output_location: String,

    /// Seconds between status polls.
    pub poll_interval_secs: u64,

    /// Wall-clock ceiling for one execution; expiry is reported as an
    /// infrastructure failure.
    pub deadline_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_location: "results://sqlpilot-query-results/".to_string(),
            poll_interval_secs: 2,
            deadline_secs: 300,
        }
    }
}

/// Correction loop budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum executions per run.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: EndpointsConfig,
    pub model: ModelConfig,
    pub engine: EngineConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SQLPILOT_CATALOG_URL") {
            self.endpoints.catalog_url = url;
        }
        if let Ok(url) = std::env::var("SQLPILOT_MODEL_URL") {
            self.endpoints.model_url = url;
        }
        if let Ok(url) = std::env::var("SQLPILOT_KB_URL") {
            self.endpoints.knowledge_base_url = url;
        }
        if let Ok(url) = std::env::var("SQLPILOT_ENGINE_URL") {
            self.endpoints.engine_url = url;
        }

        if let Ok(id) = std::env::var("SQLPILOT_MODEL_ID") {
            self.model.model_id = id;
        }
        if let Ok(id) = std::env::var("SQLPILOT_KB_ID") {
            self.model.knowledge_base_id = id;
        }

        if let Ok(location) = std::env::var("SQLPILOT_OUTPUT_LOCATION") {
            self.engine.output_location = location;
        }
        if let Ok(max) = std::env::var("SQLPILOT_RETRY_MAX") {
            if let Ok(max_num) = max.parse() {
                self.retry.max_attempts = max_num;
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Optional model API key from the environment (must be in .env).
    pub fn model_api_key() -> Option<String> {
        dotenvy::dotenv().ok();
        std::env::var("SQLPILOT_MODEL_API_KEY").ok()
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.engine.poll_interval_secs, 2);
        assert_eq!(config.engine.deadline_secs, 300);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stdout");
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("SQLPILOT_RETRY_MAX", "5");
        std::env::set_var("SQLPILOT_ENGINE_URL", "http://engine.internal:8443");

        let config_yaml = r#"
endpoints:
  catalog_url: "http://localhost:9021"
  model_url: "http://localhost:9022"
  knowledge_base_url: "http://localhost:9023"
  engine_url: "http://localhost:9024"
retry:
  max_attempts: 3
"#;
        let temp_file = std::env::temp_dir().join("test_sqlpilot_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.retry.max_attempts, 5); // Overridden
        assert_eq!(config.endpoints.engine_url, "http://engine.internal:8443"); // Overridden
        assert_eq!(config.endpoints.catalog_url, "http://localhost:9021");

        std::env::remove_var("SQLPILOT_RETRY_MAX");
        std::env::remove_var("SQLPILOT_ENGINE_URL");
        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: Config = serde_yaml::from_str("model:\n  model_id: sql-gen\n").unwrap();
        assert_eq!(config.model.model_id, "sql-gen");
        assert_eq!(config.retry.max_attempts, 3);
    }
}
