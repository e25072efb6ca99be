use crate::config::AppConfig;
use crate::utils::error::{Result, ScoutError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// 可選的 TOML 設定檔；所有欄位皆可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub input: Option<InputSection>,
    pub output: Option<OutputSection>,
    pub oracle: Option<OracleSection>,
    pub renderer: Option<RendererSection>,
    pub run: Option<RunSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSection {
    pub dir: Option<PathBuf>,
    pub manufacturers_file: Option<String>,
    pub component_types_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RendererSection {
    pub navigation_timeout_secs: Option<u64>,
    pub max_page_chars: Option<usize>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSection {
    pub only: Option<Vec<String>>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ScoutError::ConfigError {
            message: format!("cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScoutError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ANTHROPIC_API_KEY})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 把檔案中有設定的值覆蓋到 `config`
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(input) = self.input {
            if let Some(dir) = input.dir {
                config.input_dir = dir;
            }
            if let Some(file) = input.manufacturers_file {
                config.manufacturers_file = file;
            }
            if let Some(file) = input.component_types_file {
                config.component_types_file = file;
            }
        }
        if let Some(dir) = self.output.and_then(|o| o.dir) {
            config.output_dir = dir;
        }
        if let Some(oracle) = self.oracle {
            if let Some(api_key) = oracle.api_key {
                config.api_key = api_key;
            }
            if let Some(base_url) = oracle.base_url {
                config.oracle_base_url = base_url;
            }
            if let Some(model) = oracle.model {
                config.model = model;
            }
            if let Some(max_tokens) = oracle.max_tokens {
                config.max_tokens = max_tokens;
            }
        }
        if let Some(renderer) = self.renderer {
            if let Some(timeout) = renderer.navigation_timeout_secs {
                config.navigation_timeout_secs = timeout;
            }
            if let Some(max_page_chars) = renderer.max_page_chars {
                config.max_page_chars = max_page_chars;
            }
            if let Some(user_agent) = renderer.user_agent {
                config.user_agent = user_agent;
            }
        }
        if let Some(only) = self.run.and_then(|r| r.only) {
            config.only = only;
        }
    }
}
