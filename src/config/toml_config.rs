use crate::config::{DEFAULT_BIND_ADDRESS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RiskError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RiskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODEL_DIR})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_address("server.bind_address", self.bind_address())?;
        validation::validate_range(
            "server.request_timeout_secs",
            self.request_timeout_secs(),
            1,
            600,
        )?;

        let path = validation::validate_required_field("model.path", &self.model.path)?;
        validation::validate_path("model.path", path)?;
        if path.contains("${") {
            return Err(RiskError::InvalidConfigValueError {
                field: "model.path".to_string(),
                value: path.clone(),
                reason: "Unresolved environment variable".to_string(),
            });
        }
        validation::validate_file_extension("model.path", path, &["json"])?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_address(&self) -> &str {
        self.server
            .bind_address
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    fn model_path(&self) -> &str {
        self.model.path.as_deref().unwrap_or_default()
    }

    fn request_timeout_secs(&self) -> u64 {
        self.server
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[server]
bind_address = "0.0.0.0:8080"
request_timeout_secs = 10

[model]
path = "models/heart_pipeline.json"

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.request_timeout_secs(), 10);
        assert_eq!(config.model_path(), "models/heart_pipeline.json");
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = TomlConfig::from_toml_str("[model]\npath = \"p.json\"\n").unwrap();
        assert_eq!(config.bind_address(), DEFAULT_BIND_ADDRESS);
        assert_eq!(config.request_timeout_secs(), DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(!config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HEART_RISK_TEST_MODEL_DIR", "/srv/models");

        let toml_content = r#"
[model]
path = "${HEART_RISK_TEST_MODEL_DIR}/heart_pipeline.json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model_path(), "/srv/models/heart_pipeline.json");

        std::env::remove_var("HEART_RISK_TEST_MODEL_DIR");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let toml_content = r#"
[model]
path = "${HEART_RISK_TEST_UNSET_VAR}/heart_pipeline.json"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_model_path() {
        let config = TomlConfig::from_toml_str("[model]\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(RiskError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbind_address = \"127.0.0.1:9000\"\n\n[model]\npath = \"m.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
