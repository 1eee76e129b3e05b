use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

/// Fully merged settings for one invocation: YAML file first, then
/// environment overrides. The token is the only mandatory value.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub api_token: String,
    pub ops_webhook: Option<String>,
}

pub const DEFAULT_BASE_URL: &str = "https://learn-2.galvanize.com";

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    ops_webhook: Option<String>,
}

/// Loads settings from an optional YAML file and the environment.
/// Environment variables win over the file; `LEARN_API_TOKEN` (or the
/// file's `api_token`) must be present.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let file_conf = match path {
        Some(path) => {
            info!(config_path = ?path, "Loading configuration from file");
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {path:?}"))?;
            let conf: SettingsFile = serde_yaml::from_str(&content).map_err(|e| {
                error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
                anyhow::anyhow!("Failed to parse config YAML: {e}")
            })?;
            info!(config_path = ?path, "Parsed config YAML successfully");
            conf
        }
        None => SettingsFile::default(),
    };

    let base_url = std::env::var("LEARN_BASE_URL")
        .ok()
        .or(file_conf.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let api_token = match std::env::var("LEARN_API_TOKEN").ok().or(file_conf.api_token) {
        Some(token) if !token.is_empty() => token,
        _ => {
            error!("No API token in environment or config file");
            anyhow::bail!(
                "No API token configured. Set LEARN_API_TOKEN or add api_token to your config file."
            );
        }
    };

    let ops_webhook = std::env::var("LEARN_OPS_WEBHOOK")
        .ok()
        .or(file_conf.ops_webhook);

    info!(base_url = %base_url, "Config loaded and merged successfully");

    Ok(Settings {
        base_url,
        api_token,
        ops_webhook,
    })
}
