//! Task checklist commands.

use anyhow::Result;
use caretrack_core::{
    NewTask, RetryPolicy, ServiceError, SystemClock, TaskService, TaskStatusChange,
};
use clap::Subcommand;
use rusqlite::Connection;

use crate::{print_json, store};

/// Task subcommands.
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a task to a schedule.
    Add {
        #[arg(long)]
        schedule_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List the tasks of a schedule.
    List {
        #[arg(long)]
        schedule_id: i64,
    },
    /// Mark a task completed or not_completed.
    Status {
        id: i64,
        /// completed|not_completed
        status: String,
        /// Required for not_completed.
        #[arg(long)]
        reason: Option<String>,
    },
    /// Delete a task.
    Delete { id: i64 },
}

/// Execute a task subcommand.
///
/// # Errors
///
/// Returns an error if input is invalid, a record is missing, or storage
/// fails.
pub fn execute(command: TaskCommand, conn: &Connection) -> Result<()> {
    let service = TaskService::new(store(conn)?, SystemClock, RetryPolicy::default());

    match command {
        TaskCommand::Add {
            schedule_id,
            title,
            description,
        } => {
            let request = NewTask {
                schedule_id,
                title,
                description,
            };
            print_json(&service.create_task(&request)?)
        }
        TaskCommand::List { schedule_id } => print_json(&service.list_tasks(schedule_id)?),
        TaskCommand::Status { id, status, reason } => {
            let change =
                TaskStatusChange::parse(&status, reason.as_deref()).map_err(ServiceError::from)?;
            print_json(&service.update_status(id, &change)?)
        }
        TaskCommand::Delete { id } => {
            service.delete_task(id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
