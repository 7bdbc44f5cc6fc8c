use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::page::DEFAULT_PAGE_PATH;

pub const API_URL_ENV: &str = "QBROWSE_API_URL";
pub const API_KEY_ENV: &str = "QBROWSE_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `[api]` block from config.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub page_path: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Top-level qbrowse config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct QbrowseConfig {
    pub api: Option<ApiConfig>,
}

impl QbrowseConfig {
    /// Load config from ~/.qbrowse/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(QbrowseConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config.toml")
    }

    pub fn page_path(&self) -> String {
        self.api
            .as_ref()
            .and_then(|a| a.page_path.clone())
            .unwrap_or_else(|| DEFAULT_PAGE_PATH.to_string())
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .api
            .as_ref()
            .and_then(|a| a.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Base URL: CLI flag > env var > config. None means the built-in default.
    pub fn base_url(&self, cli_flag: Option<&str>) -> Option<String> {
        if let Some(url) = cli_flag.filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                return Some(url);
            }
        }
        self.api.as_ref().and_then(|a| a.base_url.clone())
    }

    /// Display config with secrets redacted.
    pub fn display_redacted(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref api) = self.api {
            lines.push("[api]".to_string());
            display_api_config(&mut lines, api);
        }
        if lines.is_empty() {
            lines.push("(no api configured; using defaults)".to_string());
        }
        lines.join("\n")
    }
}

fn display_api_config(lines: &mut Vec<String>, api: &ApiConfig) {
    if let Some(ref url) = api.base_url {
        lines.push(format!("  base_url = \"{}\"", url));
    }
    if let Some(ref key) = api.api_key {
        lines.push(format!("  api_key = \"{}\"", redact(key)));
    }
    if let Some(ref cmd) = api.api_key_command {
        lines.push(format!("  api_key_command = \"{}\"", cmd));
    }
    if let Some(ref path) = api.page_path {
        lines.push(format!("  page_path = \"{}\"", path));
    }
    if let Some(secs) = api.timeout_secs {
        lines.push(format!("  timeout_secs = {}", secs));
    }
}

fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Resolve the API token through the chain: CLI flag > env var > config key > config command.
///
/// Returns Ok(None) when no source provides one.
pub fn resolve_api_key(cli_flag: Option<&str>, config: Option<&ApiConfig>) -> Result<Option<String>> {
    // 1. CLI flag
    if let Some(key) = cli_flag {
        if !key.is_empty() {
            return Ok(Some(key.to_string()));
        }
    }

    // 2. Environment variable
    if let Ok(val) = std::env::var(API_KEY_ENV) {
        if !val.is_empty() {
            return Ok(Some(val));
        }
    }

    if let Some(api) = config {
        // 3. Config file api_key
        if let Some(ref key) = api.api_key {
            if !key.is_empty() {
                return Ok(Some(key.clone()));
            }
        }

        // 4. External command
        if let Some(ref cmd) = api.api_key_command {
            if !cmd.is_empty() {
                return run_key_command(cmd).map(Some);
            }
        }
    }

    Ok(None)
}

fn run_key_command(cmd: &str) -> Result<String> {
    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .output()
        .with_context(|| format!("Failed to run api_key_command: {cmd}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "api_key_command failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    let secret = String::from_utf8(output.stdout)
        .context("api_key_command output is not valid UTF-8")?
        .trim()
        .to_string();

    if secret.is_empty() {
        bail!("api_key_command printed nothing");
    }
    Ok(secret)
}

/// Path to the config file: ~/.qbrowse/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".qbrowse").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.qbrowse/config.toml
# Base URL resolution order: --api-url > QBROWSE_API_URL > base_url
# Token resolution order:    --api-key > QBROWSE_API_KEY > api_key > api_key_command

[api]
# base_url = "https://www.techinterviewhandbook.org"
# api_key = "your-session-token"
# api_key_command = "your-secrets-manager-command-here"
# page_path = "/questions/browse"
# timeout_secs = 30
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    let path = config_path()?;
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_empty_api_block() {
        let config = QbrowseConfig::parse(default_config_template()).unwrap();
        let api = config.api.unwrap();
        assert!(api.base_url.is_none());
        assert!(api.api_key.is_none());
    }

    #[test]
    fn defaults_apply_without_config() {
        let config = QbrowseConfig::default();
        assert_eq!(config.page_path(), DEFAULT_PAGE_PATH);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.base_url(Some("http://flag")).as_deref(), Some("http://flag"));
    }

    #[test]
    fn redacted_display_hides_key() {
        let config = QbrowseConfig::parse(
            "[api]\nbase_url = \"https://example.org\"\napi_key = \"abcd1234efgh5678\"\ntimeout_secs = 5\n",
        )
        .unwrap();
        let shown = config.display_redacted();
        assert!(shown.contains("abcd...5678"));
        assert!(!shown.contains("1234efgh"));
        assert!(shown.contains("timeout_secs = 5"));
    }

    #[test]
    fn redaction_respects_multibyte_characters() {
        let config = QbrowseConfig::parse("[api]\napi_key = \"aéééééééé\"\n").unwrap();
        let shown = config.display_redacted();
        assert!(shown.contains("aééé...éééé"));

        assert_eq!(redact("ключ-ключ-ключ"), "ключ...ключ");
        assert_eq!(redact("éééé"), "****");
    }

    #[test]
    fn cli_flag_wins_for_api_key() {
        let api = ApiConfig {
            api_key: Some("from-config".into()),
            ..Default::default()
        };
        let key = resolve_api_key(Some("from-flag"), Some(&api)).unwrap();
        assert_eq!(key.as_deref(), Some("from-flag"));
    }

    #[test]
    fn key_command_output_is_trimmed() {
        let api = ApiConfig {
            api_key_command: Some("printf '  secret\\n'".into()),
            ..Default::default()
        };
        assert_eq!(run_key_command(api.api_key_command.as_deref().unwrap()).unwrap(), "secret");
    }
}
