//! Schedule commands.

use anyhow::Result;
use caretrack_core::{
    NewSchedule, ScheduleFilter, ScheduleService, ScheduleStatus, SystemClock,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use rusqlite::Connection;

use crate::{print_json, store};

/// Schedule subcommands.
#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Plan an appointment.
    Add(AddScheduleArgs),
    /// List schedules with their persisted status.
    List(ListScheduleArgs),
    /// Show one schedule with client, visit and tasks.
    Show { id: i64 },
    /// Today's schedules of a caregiver with live status.
    Today {
        #[arg(long)]
        caregiver_id: i64,
    },
    /// Dashboard counters of a caregiver.
    Stats {
        #[arg(long)]
        caregiver_id: i64,
    },
}

#[derive(Debug, Args)]
pub struct AddScheduleArgs {
    #[arg(long)]
    pub client_id: i64,
    #[arg(long)]
    pub caregiver_id: i64,
    #[arg(long, default_value = "")]
    pub service_name: String,
    /// RFC 3339 start, e.g. 2026-05-04T08:00:00Z.
    #[arg(long)]
    pub start: DateTime<Utc>,
    /// RFC 3339 end.
    #[arg(long)]
    pub end: DateTime<Utc>,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Debug, Args)]
pub struct ListScheduleArgs {
    #[arg(long)]
    pub caregiver_id: Option<i64>,
    /// Local calendar day, e.g. 2026-05-04.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// scheduled|in_progress|completed|missed
    #[arg(long)]
    pub status: Option<ScheduleStatus>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, default_value = "0")]
    pub offset: u32,
}

/// Execute a schedule subcommand.
///
/// # Errors
///
/// Returns an error if a referenced record is missing, input is invalid,
/// or storage fails.
pub fn execute(command: ScheduleCommand, conn: &Connection) -> Result<()> {
    let service = ScheduleService::new(store(conn)?, SystemClock);

    match command {
        ScheduleCommand::Add(args) => {
            let request = NewSchedule {
                client_id: args.client_id,
                caregiver_id: args.caregiver_id,
                service_name: args.service_name,
                start_time: args.start,
                end_time: args.end,
                notes: args.notes,
            };
            print_json(&service.create_schedule(&request)?)
        }
        ScheduleCommand::List(args) => {
            let filter = ScheduleFilter {
                caregiver_id: args.caregiver_id,
                date: args.date,
                status: args.status,
                limit: args.limit,
                offset: args.offset,
            };
            print_json(&service.list_schedules(&filter)?)
        }
        ScheduleCommand::Show { id } => print_json(&service.get_schedule(id)?),
        ScheduleCommand::Today { caregiver_id } => {
            print_json(&service.today_schedules(caregiver_id)?)
        }
        ScheduleCommand::Stats { caregiver_id } => {
            print_json(&service.schedule_stats(caregiver_id)?)
        }
    }
}
