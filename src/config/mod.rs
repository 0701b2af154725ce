pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_MODEL_PATH: &str = "models/heart_pipeline.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "heart-risk-form")]
#[command(about = "Heart disease risk form backed by a pre-trained pipeline")]
pub struct CliConfig {
    /// TOML configuration file; when given, its values replace the flags below
    #[arg(short, long, env = "HEART_RISK_CONFIG")]
    pub config: Option<String>,

    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// Path to the pipeline artifact (JSON)
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Emit logs as JSON
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn bind_address(&self) -> &str {
        &self.bind_address
    }

    fn model_path(&self) -> &str {
        &self.model_path
    }

    fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    fn json_logs(&self) -> bool {
        self.json_logs
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_socket_address("bind_address", &self.bind_address)?;
        validation::validate_path("model_path", &self.model_path)?;
        validation::validate_file_extension("model_path", &self.model_path, &["json"])?;
        validation::validate_range("request_timeout_secs", self.request_timeout_secs, 1, 600)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["heart-risk-form"]);
        assert_eq!(config.model_path(), DEFAULT_MODEL_PATH);
        assert_eq!(config.request_timeout_secs(), 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_address() {
        let config = CliConfig::parse_from(["heart-risk-form", "--bind-address", "nowhere"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_json_model() {
        let config = CliConfig::parse_from([
            "heart-risk-form",
            "--model-path",
            "dt_heart_pipeline.joblib",
        ]);
        assert!(config.validate().is_err());
    }
}
