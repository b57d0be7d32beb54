//! # caretrack_cli
//!
//! Command-line surface over `caretrack_core`.
//!
//! ## Commands
//!
//! - `caretrack client` - register, inspect and remove clients
//! - `caretrack schedule` - plan appointments and view the dashboard
//! - `caretrack visit` - start, end and cancel visits
//! - `caretrack task` - manage per-schedule checklists
//! - `caretrack seed-demo` - insert sample data around the current time
//!
//! ## Configuration
//!
//! - `CARETRACK_DB` - database file (default: `caretrack.db`)
//! - `CARETRACK_LOG_LEVEL` - log level (default: `debug` in debug builds,
//!   `info` in release builds)
//! - `CARETRACK_LOG_DIR` - absolute directory for rolling log files; file
//!   logging is off when unset
//!
//! Results are printed as pretty JSON on stdout.

#![forbid(unsafe_code)]
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;

use anyhow::{Context, Result};
use caretrack_core::db::open_db;
use caretrack_core::{ErrorKind, ServiceError, SqliteStore};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;

/// Caregiver visit tracking.
#[derive(Debug, Parser)]
#[command(name = "caretrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, env = "CARETRACK_DB", default_value = "caretrack.db")]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "CARETRACK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for log files.
    #[arg(long, env = "CARETRACK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective configuration with build-mode defaults applied.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            db: self.db.clone(),
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| caretrack_core::default_log_level().to_string()),
            log_dir: self.log_dir.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage clients.
    #[command(subcommand)]
    Client(commands::client::ClientCommand),
    /// Manage schedules.
    #[command(subcommand)]
    Schedule(commands::schedule::ScheduleCommand),
    /// Drive the visit lifecycle.
    #[command(subcommand)]
    Visit(commands::visit::VisitCommand),
    /// Manage schedule tasks.
    #[command(subcommand)]
    Task(commands::task::TaskCommand),
    /// Insert demo clients, schedules and tasks.
    SeedDemo(commands::seed::SeedArgs),
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

/// Initializes logging when requested, opens the database and runs `command`.
///
/// # Errors
///
/// Returns an error if logging or the database cannot be initialized, or if
/// the command fails.
pub fn run(command: Commands, config: &Config) -> Result<()> {
    if let Some(log_dir) = &config.log_dir {
        caretrack_core::init_logging(&config.log_level, log_dir)
            .context("failed to initialize logging")?;
    }

    let conn = open_connection(config)?;
    match command {
        Commands::Client(cmd) => commands::client::execute(cmd, &conn),
        Commands::Schedule(cmd) => commands::schedule::execute(cmd, &conn),
        Commands::Visit(cmd) => commands::visit::execute(cmd, &conn),
        Commands::Task(cmd) => commands::task::execute(cmd, &conn),
        Commands::SeedDemo(args) => commands::seed::execute(&args, &conn),
    }
}

/// Process exit code for a failed command.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ServiceError>())
        .map(ServiceError::kind);

    match kind {
        Some(ErrorKind::NotFound) => 3,
        Some(
            ErrorKind::TooEarly
            | ErrorKind::NotStarted
            | ErrorKind::InvalidTransition
            | ErrorKind::Validation
            | ErrorKind::Conflict,
        ) => 2,
        Some(ErrorKind::StorageFailure) => 4,
        None => 1,
    }
}

fn open_connection(config: &Config) -> Result<Connection> {
    open_db(&config.db)
        .map_err(|err| ServiceError::StorageFailure(err.into()))
        .with_context(|| format!("failed to open {}", config.db.display()))
}

pub(crate) fn store(conn: &Connection) -> Result<SqliteStore<'_>> {
    Ok(SqliteStore::try_new(conn).map_err(ServiceError::from)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
