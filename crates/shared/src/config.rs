//! Application configuration management.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Document storage configuration.
    pub storage: StorageSettings,
    /// Text-generation service configuration.
    pub generation: GenerationConfig,
    /// Document extraction (OCR) service configuration.
    pub extraction: ExtractionConfig,
    /// Pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Where invoice documents are read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum StorageSettings {
    /// S3-compatible bucket (Supabase Storage, Cloudflare R2, AWS S3).
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// Bucket holding the uploaded invoices.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        #[serde(default = "default_region")]
        region: String,
    },
    /// Local directory (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

fn default_region() -> String {
    "auto".to_string()
}

/// Text-generation service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the generative language API.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    /// Sampling temperature. Ensembles rely on this being non-zero.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_request_timeout() -> u64 {
    120
}

/// Document extraction service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Service account key file contents (JSON with `client_email` and `private_key`).
    pub service_account_json: String,
    /// Cloud project ID.
    pub project_id: String,
    /// Processor location, e.g. `eu` or `us`.
    pub location: String,
    /// Processor ID.
    pub processor_id: String,
    /// Overrides the processor endpoint derived from location/project/processor.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ExtractionConfig {
    /// Returns the `:process` endpoint for the configured processor.
    #[must_use]
    pub fn process_url(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{loc}-documentai.googleapis.com/v1/projects/{project}/locations/{loc}/processors/{processor}:process",
                loc = self.location,
                project = self.project_id,
                processor = self.processor_id,
            )
        })
    }
}

/// Ensemble size and the agreement required for a value to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnsembleConfig {
    /// Number of independent calls issued with the same prompt.
    pub calls: usize,
    /// Minimum number of identical, non-empty answers.
    pub required_agreement: usize,
}

/// Pipeline tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of pages sent to the extraction service per document.
    #[serde(default = "default_ocr_max_pages")]
    pub ocr_max_pages: u32,
    /// Maximum number of OCR items processed per invocation.
    #[serde(default = "default_ocr_batch_size")]
    pub ocr_batch_size: usize,
    /// Supplier resolution ensemble.
    #[serde(default = "default_supplier_ensemble")]
    pub supplier_ensemble: EnsembleConfig,
    /// Account/department classification ensemble.
    #[serde(default = "default_account_ensemble")]
    pub account_ensemble: EnsembleConfig,
    /// Absolute tolerance when reconciling VAT lines against the payable amount.
    #[serde(default = "default_reconciliation_tolerance")]
    pub reconciliation_tolerance: Decimal,
    /// Maximum stored length of a queue item's error message.
    #[serde(default = "default_error_message_limit")]
    pub error_message_limit: usize,
}

fn default_ocr_max_pages() -> u32 {
    5
}

fn default_ocr_batch_size() -> usize {
    10
}

fn default_supplier_ensemble() -> EnsembleConfig {
    EnsembleConfig {
        calls: 5,
        required_agreement: 5,
    }
}

fn default_account_ensemble() -> EnsembleConfig {
    EnsembleConfig {
        calls: 3,
        required_agreement: 2,
    }
}

fn default_reconciliation_tolerance() -> Decimal {
    Decimal::new(2, 2)
}

fn default_error_message_limit() -> usize {
    2000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ocr_max_pages: default_ocr_max_pages(),
            ocr_batch_size: default_ocr_batch_size(),
            supplier_ensemble: default_supplier_ensemble(),
            account_ensemble: default_account_ensemble(),
            reconciliation_tolerance: default_reconciliation_tolerance(),
            error_message_limit: default_error_message_limit(),
        }
    }
}

impl PipelineConfig {
    /// Checks that the tuning values describe a runnable pipeline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` naming the first offending setting.
    pub fn validate(&self) -> AppResult<()> {
        if self.ocr_max_pages == 0 {
            return Err(AppError::Configuration(
                "pipeline.ocr_max_pages must be at least 1".to_string(),
            ));
        }
        for (name, ensemble) in [
            ("supplier_ensemble", self.supplier_ensemble),
            ("account_ensemble", self.account_ensemble),
        ] {
            if ensemble.calls == 0 {
                return Err(AppError::Configuration(format!(
                    "pipeline.{name}.calls must be at least 1"
                )));
            }
            if ensemble.required_agreement == 0 || ensemble.required_agreement > ensemble.calls {
                return Err(AppError::Configuration(format!(
                    "pipeline.{name}.required_agreement must be between 1 and {}",
                    ensemble.calls
                )));
            }
        }
        if self.reconciliation_tolerance.is_sign_negative() {
            return Err(AppError::Configuration(
                "pipeline.reconciliation_tolerance must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("AUTOBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Rejects configurations the pipeline cannot run with.
    ///
    /// Missing credentials are fatal at startup rather than per work item.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` describing the problem.
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("database.url", &self.database.url),
            ("generation.api_key", &self.generation.api_key),
            (
                "extraction.service_account_json",
                &self.extraction.service_account_json,
            ),
            ("extraction.project_id", &self.extraction.project_id),
            ("extraction.location", &self.extraction.location),
            ("extraction.processor_id", &self.extraction.processor_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Configuration(format!("{name} is required")));
            }
        }
        self.pipeline.validate()
    }
}
