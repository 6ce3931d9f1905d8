use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProfileConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Applies `key = value` after validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => self.server = Some(validate_server(value)?),
            "format" => match value {
                "json" | "table" => self.format = Some(value.to_string()),
                other => anyhow::bail!("Invalid format: {other}. Valid formats: json, table"),
            },
            "timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs: {value}"))?;
                if secs == 0 {
                    anyhow::bail!("timeout_secs must be greater than zero");
                }
                self.timeout_secs = Some(secs);
            }
            other => {
                anyhow::bail!("Unknown config key: {other}. Valid keys: server, format, timeout_secs")
            }
        }
        Ok(())
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

pub(crate) fn home_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".tharsis");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(home_dir()?.join("config.toml"))
}

fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

/// Checks that `server` is an absolute http(s) URL.
pub fn validate_server(server: &str) -> Result<String> {
    let parsed = url::Url::parse(server).with_context(|| format!("Invalid server URL: {server}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(server.trim_end_matches('/').to_string()),
        other => anyhow::bail!("Unsupported URL scheme \"{other}\" in {server}"),
    }
}

pub fn resolve_server(cli_server: &Option<String>, profile: &str) -> Result<String> {
    // 1. --server flag / THARSIS_URL env
    if let Some(s) = cli_server {
        return validate_server(s);
    }
    // 2. config.toml profile
    let cfg = load_profile(profile)?;
    if let Some(s) = cfg.server {
        return validate_server(&s);
    }
    // 3. Stored credentials for this profile
    if let Ok(Some(creds)) = crate::auth::load_credentials(profile) {
        return validate_server(&creds.server);
    }
    anyhow::bail!(
        "No server URL configured. Use --server, set THARSIS_URL env var, or run: tharsis config set server <url>"
    )
}
