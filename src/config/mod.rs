#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::reference_data::{COMPONENT_TYPES_FILE, MANUFACTURERS_FILE};
use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT_DIR: &str = "./component_output";
pub const DEFAULT_ORACLE_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PAGE_CHARS: usize = 100_000;
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// 啟動時建立一次，之後以參考傳入各元件
#[derive(Clone)]
pub struct AppConfig {
    pub input_dir: PathBuf,
    pub manufacturers_file: String,
    pub component_types_file: String,
    pub output_dir: PathBuf,
    pub api_key: String,
    pub oracle_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub navigation_timeout_secs: u64,
    pub max_page_chars: usize,
    pub user_agent: String,
    pub only: Vec<String>,
}

impl AppConfig {
    /// 除了 API 金鑰以外全部使用預設值
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            input_dir: PathBuf::from("."),
            manufacturers_file: MANUFACTURERS_FILE.to_string(),
            component_types_file: COMPONENT_TYPES_FILE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            api_key: api_key.into(),
            oracle_base_url: DEFAULT_ORACLE_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            max_page_chars: DEFAULT_MAX_PAGE_CHARS,
            user_agent: format!("hvac-scout/{}", env!("CARGO_PKG_VERSION")),
            only: Vec::new(),
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("input_dir", &self.input_dir)
            .field("manufacturers_file", &self.manufacturers_file)
            .field("component_types_file", &self.component_types_file)
            .field("output_dir", &self.output_dir)
            .field("api_key", &"<redacted>")
            .field("oracle_base_url", &self.oracle_base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("max_page_chars", &self.max_page_chars)
            .field("user_agent", &self.user_agent)
            .field("only", &self.only)
            .finish()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        // 未替換的 ${VAR} 視同沒有設定
        if self.api_key.trim().is_empty() || self.api_key.contains("${") {
            return Err(ScoutError::MissingConfigError {
                field: API_KEY_ENV.to_string(),
            });
        }

        validate_path("input_dir", &self.input_dir.to_string_lossy())?;
        validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        validate_non_empty_string("manufacturers_file", &self.manufacturers_file)?;
        validate_non_empty_string("component_types_file", &self.component_types_file)?;
        validate_url("oracle.base_url", &self.oracle_base_url)?;
        validate_non_empty_string("oracle.model", &self.model)?;
        validate_range("oracle.max_tokens", self.max_tokens, 1, 200_000)?;
        validate_range(
            "renderer.navigation_timeout_secs",
            self.navigation_timeout_secs,
            1,
            600,
        )?;
        validate_positive_number("renderer.max_page_chars", self.max_page_chars, 1)?;
        validate_non_empty_string("renderer.user_agent", &self.user_agent)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::with_api_key("sk-test");
        assert!(config.validate().is_ok());
        assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.output_dir, PathBuf::from("./component_output"));
    }

    #[test]
    fn test_missing_api_key_prevents_startup() {
        let config = AppConfig::with_api_key("");
        match config.validate() {
            Err(ScoutError::MissingConfigError { field }) => assert_eq!(field, API_KEY_ENV),
            other => panic!("unexpected result: {:?}", other),
        }

        let unresolved = AppConfig::with_api_key("${ANTHROPIC_API_KEY}");
        assert!(unresolved.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AppConfig::with_api_key("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::with_api_key("sk-test");
        config.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::with_api_key("sk-test");
        config.oracle_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }
}
