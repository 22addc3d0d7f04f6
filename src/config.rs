use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::ui::UiMode;

const FALLBACK_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

/// Base URL baked in at build time from `VISIONGUARD_API_BASE_URL`, or the
/// local development server.
pub fn default_base_url() -> &'static str {
    match option_env!("VISIONGUARD_API_BASE_URL") {
        Some(url) if !url.trim().is_empty() => url,
        _ => FALLBACK_BASE_URL,
    }
}

#[derive(Debug, Deserialize, Default)]
struct ClientConfigFile {
    api: Option<ApiConfigFile>,
    ui: Option<UiConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct UiConfigFile {
    mode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub ui_mode: UiMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
            ui_mode: UiMode::Auto,
        }
    }
}

impl ClientConfig {
    /// Defaults, then the JSON file named by `VISIONGUARD_CONFIG`, then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VISIONGUARD_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ClientConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let api_base_url = file
            .api
            .as_ref()
            .and_then(|api| api.base_url.clone())
            .unwrap_or(defaults.api_base_url);
        let timeout = file
            .api
            .as_ref()
            .and_then(|api| api.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let ui_mode = match file.ui.and_then(|ui| ui.mode) {
            Some(mode) => UiMode::parse(&mode)?,
            None => defaults.ui_mode,
        };
        Ok(Self {
            api_base_url,
            timeout,
            ui_mode,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("VISIONGUARD_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var("VISIONGUARD_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("VISIONGUARD_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.timeout = Duration::from_secs(seconds);
        }
        if let Ok(mode) = std::env::var("VISIONGUARD_UI") {
            if !mode.trim().is_empty() {
                self.ui_mode = UiMode::parse(&mode)?;
            }
        }
        Ok(())
    }

    /// Check the base URL and timeout. Called by `load` and again after CLI
    /// overrides.
    pub fn validate(&mut self) -> Result<()> {
        let parsed = url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow!("invalid api base url '{}': {}", self.api_base_url, e))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported api base url scheme '{}'; expected http or https",
                    other
                ))
            }
        }
        if parsed.host_str().is_none() {
            return Err(anyhow!("api base url '{}' has no host", self.api_base_url));
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();

        if self.timeout.is_zero() {
            return Err(anyhow!("timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ClientConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
