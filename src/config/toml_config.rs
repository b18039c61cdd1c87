use crate::core::journal::MonitorSettings;
use crate::utils::error::{CargoError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CargoConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub refresh_interval_seconds: Option<u64>,
    pub stale_after_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl SourceConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }
}

impl MonitorConfig {
    pub fn settings(&self) -> MonitorSettings {
        let defaults = MonitorSettings::default();
        MonitorSettings {
            refresh_interval: self
                .refresh_interval_seconds
                .map(seconds)
                .unwrap_or(defaults.refresh_interval),
            stale_after: self
                .stale_after_seconds
                .map(seconds)
                .unwrap_or(defaults.stale_after),
        }
    }
}

fn seconds(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1000))
}

impl CargoConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CargoError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CargoError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CAPI_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::{Captures, Regex};
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid pattern"));

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(endpoint) = &self.source.endpoint {
            validation::validate_url("source.endpoint", endpoint)?;
        }

        if let Some(token) = &self.source.access_token {
            validation::validate_non_empty_string("source.access_token", token)?;
            if token.starts_with("${") {
                return Err(CargoError::InvalidConfigValueError {
                    field: "source.access_token".to_string(),
                    value: token.clone(),
                    reason: "Environment variable is not set".to_string(),
                });
            }
        }

        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }
        if let Some(interval) = self.monitor.refresh_interval_seconds {
            validation::validate_positive_number("monitor.refresh_interval_seconds", interval, 1)?;
        }
        if let Some(stale) = self.monitor.stale_after_seconds {
            validation::validate_positive_number("monitor.stale_after_seconds", stale, 1)?;
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl Validate for CargoConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
