// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use outlay_remote::{
    DEFAULT_BASE_URL, DEFAULT_COLLECTION, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT, RemoteSettings,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "outlay.log";

/// Which store the binary talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Remote,
}

/// The on-disk settings file. Every section is optional; a missing file is
/// the same as an empty `version = 1` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: Option<i64>,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: Backend,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    pub base_url: Option<String>,
    pub project_id: Option<String>,
    pub collection: Option<String>,
    pub api_key: Option<String>,
    /// `750ms`, `10s` or `1m`.
    pub timeout: Option<String>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Any `tracing_subscriber::EnvFilter` directive string.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl Config {
    /// `OUTLAY_CONFIG_PATH`, or `config.toml` in the platform config dir.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(explicit) = env::var_os("OUTLAY_CONFIG_PATH") {
            return Ok(explicit.into());
        }
        let Some(config_dir) = dirs::config_dir() else {
            bail!("no platform config directory; export OUTLAY_CONFIG_PATH=/path/to/config.toml");
        };
        let dir = config_dir.join(outlay_db::APP_NAME);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(dir.join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    version: Some(CONFIG_VERSION),
                    ..Self::default()
                });
            }
            Err(error) => {
                return Err(error).with_context(|| format!("read {}", path.display()));
            }
        };

        let config: Self = toml::from_str(&text)
            .with_context(|| format!("{} is not a valid outlay config file", path.display()))?;
        match config.version {
            Some(CONFIG_VERSION) => {}
            Some(other) => bail!(
                "{} declares config version {other}, but this build reads version {CONFIG_VERSION}",
                path.display()
            ),
            None => bail!(
                "{} has no `version` key; add `version = 1` at the top (sections: [store], [storage], [remote], [logging])",
                path.display()
            ),
        }
        config
            .check()
            .with_context(|| format!("invalid setting in {}", path.display()))?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            outlay_db::validate_db_path(&db_path.to_string_lossy())?;
        }
        if self.store.backend == Backend::Remote {
            self.project_id()?;
        }
        self.remote_timeout()?;
        if self.remote.page_size == Some(0) {
            bail!("remote.page_size must be at least 1");
        }
        EnvFilter::try_new(self.log_level()).with_context(|| {
            format!(
                "logging.level {:?} is not a filter directive; try \"info\" or \"warn,outlay_app=debug\"",
                self.log_level()
            )
        })?;
        Ok(())
    }

    pub fn backend(&self) -> Backend {
        self.store.backend
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        self.storage
            .db_path
            .clone()
            .map_or_else(outlay_db::default_db_path, Ok)
    }

    pub fn remote_settings(&self) -> Result<RemoteSettings> {
        let base_url = self
            .remote
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        Ok(RemoteSettings {
            base_url: base_url.to_owned(),
            project_id: self.project_id()?.to_owned(),
            collection: self
                .remote
                .collection
                .as_deref()
                .unwrap_or(DEFAULT_COLLECTION)
                .to_owned(),
            api_key: self
                .remote
                .api_key
                .as_ref()
                .filter(|key| !key.is_empty())
                .cloned(),
            timeout: self.remote_timeout()?,
            page_size: self.remote.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }

    fn project_id(&self) -> Result<&str> {
        match self.remote.project_id.as_deref().map(str::trim) {
            Some(project) if !project.is_empty() => Ok(project),
            _ => bail!("the remote backend needs remote.project_id"),
        }
    }

    pub fn remote_timeout(&self) -> Result<Duration> {
        let Some(raw) = self.remote.timeout.as_deref() else {
            return Ok(DEFAULT_TIMEOUT);
        };
        let timeout = parse_duration(raw).context("remote.timeout")?;
        if timeout.is_zero() {
            bail!("remote.timeout must be greater than zero");
        }
        Ok(timeout)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// `logging.file`, or `outlay.log` in the platform data dir.
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.logging.file {
            return Ok(file.clone());
        }
        let Some(data_dir) = dirs::data_local_dir() else {
            bail!("no platform data directory; set logging.file");
        };
        Ok(data_dir.join(outlay_db::APP_NAME).join(LOG_FILE))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            r#"# outlay settings, read from {path}
version = 1

[store]
# "sqlite" keeps expenses in a local file.
# "remote" talks to a Firestore-compatible REST endpoint.
backend = "sqlite"

[storage]
# db_path = "/home/me/expenses/outlay.db"

[remote]
base_url = "{base_url}"
# project_id = "my-project"
collection = "{collection}"
# api_key = ""
timeout = "{timeout}s"
page_size = {page_size}

[logging]
level = "{level}"
# file = "/tmp/outlay.log"
"#,
            path = path.display(),
            base_url = DEFAULT_BASE_URL,
            collection = DEFAULT_COLLECTION,
            timeout = DEFAULT_TIMEOUT.as_secs(),
            page_size = DEFAULT_PAGE_SIZE,
            level = DEFAULT_LOG_LEVEL,
        )
    }
}

/// Parses `<N>ms`, `<N>s` or `<N>m`.
fn parse_duration(raw: &str) -> Result<Duration> {
    let text = raw.trim();
    let unit_start = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(unit_start);
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("{raw:?} should start with a whole number, as in 750ms or 10s"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => amount
            .checked_mul(60)
            .map(Duration::from_secs)
            .with_context(|| format!("{raw:?} is too long")),
        other => bail!("{raw:?} has unit {other:?}; use ms, s or m"),
    }
}
