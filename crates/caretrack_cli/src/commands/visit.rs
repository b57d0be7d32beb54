//! Visit lifecycle commands.

use anyhow::Result;
use caretrack_core::{GeoPoint, LifecycleConfig, ServiceError, SystemClock, VisitLifecycle};
use clap::{Args, Subcommand};
use rusqlite::Connection;

use crate::{print_json, store};

/// Visit subcommands.
#[derive(Debug, Subcommand)]
pub enum VisitCommand {
    /// Check in at the client's location.
    Start(LocationArgs),
    /// Check out, optionally recording notes.
    End {
        #[command(flatten)]
        location: LocationArgs,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Return a live schedule to `scheduled`.
    Cancel { schedule_id: i64 },
    /// Show the visit recorded for a schedule.
    Show { schedule_id: i64 },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    pub schedule_id: i64,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,
}

impl LocationArgs {
    fn point(&self) -> Result<GeoPoint, ServiceError> {
        Ok(GeoPoint::new(self.latitude, self.longitude)?)
    }
}

/// Execute a visit subcommand.
///
/// # Errors
///
/// Returns an error if the transition is rejected or storage fails.
pub fn execute(command: VisitCommand, conn: &Connection) -> Result<()> {
    let engine = VisitLifecycle::new(store(conn)?, SystemClock, LifecycleConfig::default());

    match command {
        VisitCommand::Start(args) => {
            print_json(&engine.start_visit(args.schedule_id, args.point()?)?)
        }
        VisitCommand::End { location, notes } => print_json(&engine.end_visit(
            location.schedule_id,
            location.point()?,
            notes.as_deref(),
        )?),
        VisitCommand::Cancel { schedule_id } => print_json(&engine.cancel_visit(schedule_id)?),
        VisitCommand::Show { schedule_id } => print_json(&engine.get_visit(schedule_id)?),
    }
}
