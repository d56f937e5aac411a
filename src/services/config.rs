//! Layered configuration: built-in defaults, then the TOML file, then
//! environment variables, then command-line flags.
//!
//! ```toml
//! [smoke]
//! base_url = "http://127.0.0.1:8000"
//! email = "completefixtest@example.com"
//! password = "TestPass123!@#"
//! full_name = "Test User"
//! timeout_ms = 10000
//!
//! [serve]
//! bind = "127.0.0.1:8000"
//! ```

use crate::domain::constants::*;
use crate::services::base_url::{canonical_base_url, BaseUrlError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid timeout_ms: {0}")]
    InvalidTimeout(String),
    #[error(transparent)]
    BaseUrl(#[from] BaseUrlError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub smoke: SmokeSection,
    #[serde(default)]
    pub serve: ServeSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmokeSection {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    pub bind: Option<String>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub bind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    pub base_url: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub timeout_ms: u64,
    pub bind: String,
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/clm-smoke/config.toml"))
}

/// An explicit path must exist; the default path is optional.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(p) if !p.exists() => return Err(ConfigError::Missing(p.to_path_buf())),
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(FileConfig::default()),
        },
    };
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
}

pub fn resolve(
    file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
    overrides: Overrides,
) -> Result<SmokeConfig, ConfigError> {
    let pick = |flag: Option<String>, var: &str, from_file: Option<String>, default: &str| {
        flag.or_else(|| env(var).filter(|v| !v.trim().is_empty()))
            .or(from_file)
            .unwrap_or_else(|| default.to_string())
    };

    let base_url = pick(overrides.base_url, ENV_BASE_URL, file.smoke.base_url, DEFAULT_BASE_URL);
    let email = pick(overrides.email, ENV_EMAIL, file.smoke.email, DEFAULT_EMAIL);
    let password = pick(overrides.password, ENV_PASSWORD, file.smoke.password, DEFAULT_PASSWORD);
    let full_name = pick(overrides.full_name, ENV_FULL_NAME, file.smoke.full_name, DEFAULT_FULL_NAME);

    let timeout_ms = match env(ENV_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or(ConfigError::InvalidTimeout(raw))?,
        None => file.smoke.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
    };
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidTimeout("0".to_string()));
    }

    let bind = overrides
        .bind
        .or(file.serve.bind)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    Ok(SmokeConfig {
        base_url: canonical_base_url(&base_url)?,
        email,
        password,
        full_name,
        timeout_ms,
        bind,
    })
}

pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<SmokeConfig, ConfigError> {
    let file = load_file(explicit)?;
    resolve(file, |k| std::env::var(k).ok(), overrides)
}
