// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use outlay_app::Gateway;
use outlay_db::Store;
use outlay_remote::{Client, RemoteSettings};
use outlay_testkit::ExpenseFaker;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Backend, Config};

const DEMO_SEED: u64 = 2024;
const DEMO_ROWS: usize = 24;

/// Where expenses are read from and written to for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Sqlite(PathBuf),
    Demo,
    Remote(RemoteSettings),
}

impl StoreTarget {
    pub fn resolve(config: &Config, demo: bool) -> Result<Self> {
        if demo {
            return Ok(Self::Demo);
        }
        match config.backend() {
            Backend::Sqlite => Ok(Self::Sqlite(config.db_path()?)),
            Backend::Remote => Ok(Self::Remote(config.remote_settings()?)),
        }
    }

    /// The path or URL printed by `--print-path`.
    pub fn location(&self) -> Result<String> {
        match self {
            Self::Sqlite(path) => Ok(path.display().to_string()),
            Self::Demo => Ok(":memory:".to_owned()),
            Self::Remote(settings) => Ok(Client::new(settings)?.collection_url().to_owned()),
        }
    }

    pub fn open(&self) -> Result<Box<dyn Gateway>> {
        match self {
            Self::Sqlite(path) => {
                let store = Store::open(path).with_context(|| {
                    format!(
                        "open database {} -- if this path is wrong, set [storage].db_path or OUTLAY_DB_PATH",
                        path.display()
                    )
                })?;
                store.bootstrap()?;
                info!(path = %path.display(), "opened sqlite store");
                Ok(Box::new(store))
            }
            Self::Demo => {
                let store = Store::open_memory()?;
                store.bootstrap()?;
                let seeded = seed_demo(&store)?;
                info!(rows = seeded, "opened in-memory demo store");
                Ok(Box::new(store))
            }
            Self::Remote(settings) => {
                let client = Client::new(settings).context(
                    "invalid [remote] config; fix base_url/project_id/collection/timeout values",
                )?;
                info!(url = client.collection_url(), "using remote document store");
                Ok(Box::new(client))
            }
        }
    }
}

pub fn seed_demo(store: &Store) -> Result<usize> {
    let mut faker = ExpenseFaker::new(DEMO_SEED);
    for expense in faker.expenses(DEMO_ROWS) {
        store.create_expense(&expense)?;
    }
    Ok(DEMO_ROWS)
}

/// Sends `tracing` output to a log file, since the terminal belongs to the
/// UI. `RUST_LOG` overrides `[logging].level`.
pub fn init_logging(config: &Config) -> Result<PathBuf> {
    let path = config.log_path()?;
    let file = open_log_file(&path)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_level())
            .with_context(|| format!("invalid logging.level {:?}", config.log_level()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(path)
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [logging].file to a writable path",
                path.display()
            )
        })
}
