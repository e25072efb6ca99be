use crate::config::toml_config::TomlConfig;
use crate::config::AppConfig;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "hvac-scout")]
#[command(about = "Extract HVAC product listings from manufacturer websites")]
pub struct CliArgs {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing Manufacturer.json and component_types.json
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory the per-manufacturer JSON files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    /// Output token budget for each extraction request
    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub oracle_base_url: Option<String>,

    #[arg(long)]
    pub navigation_timeout_secs: Option<u64>,

    /// Only process these manufacturers (case-insensitive names)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Load and validate reference data without scraping anything
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU and memory usage while running
    #[arg(long)]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl CliArgs {
    /// 預設值 < 設定檔 < 命令列
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::with_api_key("");

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            TomlConfig::from_file(path)?.apply(&mut config);
        }

        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(base_url) = &self.oracle_base_url {
            config.oracle_base_url = base_url.clone();
        }
        if let Some(timeout) = self.navigation_timeout_secs {
            config.navigation_timeout_secs = timeout;
        }
        if !self.only.is_empty() {
            config.only = self.only.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[oracle]\nmodel = \"from-file\"\nmax_tokens = 1000\n")
            .unwrap();

        let args = CliArgs::parse_from([
            "hvac-scout",
            "--config",
            file.path().to_str().unwrap(),
            "--api-key",
            "sk-cli",
            "--max-tokens",
            "2000",
            "--only",
            "Acme Air,Carrier",
        ]);
        let config = args.resolve().unwrap();

        assert_eq!(config.model, "from-file");
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.api_key, "sk-cli");
        assert_eq!(config.only, vec!["Acme Air".to_string(), "Carrier".to_string()]);
    }

    #[test]
    fn test_defaults_without_file() {
        let args = CliArgs::parse_from(["hvac-scout", "--api-key", "sk-cli", "--dry-run"]);
        let config = args.resolve().unwrap();

        assert!(args.dry_run);
        assert_eq!(config.manufacturers_file, "Manufacturer.json");
        assert_eq!(config.navigation_timeout_secs, 30);
    }
}
