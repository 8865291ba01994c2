mod cli;
mod commands;
mod logging;

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use prep_core::model::RemoteSettingsDraft;
use services::{AppServices, Clock, LoadSource};
use tracing::{debug, warn};

use crate::cli::Cli;

#[derive(Debug)]
enum CliError {
    InvalidDbUrl { raw: String },
    NothingToUpdate,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            CliError::NothingToUpdate => {
                write!(f, "nothing to update: pass at least one field flag")
            }
        }
    }
}

impl std::error::Error for CliError {}

fn normalize_sqlite_url(raw: &str) -> Result<String, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidDbUrl { raw: raw.into() });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_string());
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let draft = RemoteSettingsDraft {
        base_url: cli.remote_url,
        api_key: cli.remote_key,
    };
    if draft.is_partial() {
        warn!("remote store needs both --remote-url and --remote-key; running local-only");
    }
    let remote = draft.validate()?;

    let db_url = normalize_sqlite_url(&cli.db)?;
    prepare_sqlite_file(&db_url)?;

    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), remote).await?;
    let (identity, source) = app.start().await?;
    if source == LoadSource::LocalFallback {
        warn!("remote store unreachable, showing the local copy");
    }
    debug!(db = %db_url, user = ?identity.map(|identity| identity.id), "ready");

    commands::execute(cli.command, &app).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(cli.verbose) {
        eprintln!("failed to initialise logging: {err}");
    }

    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
