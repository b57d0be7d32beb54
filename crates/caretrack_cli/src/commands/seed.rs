//! Demo data command.

use anyhow::Result;
use caretrack_core::{
    Clock, ClientService, NewClient, NewSchedule, NewTask, RetryPolicy, ScheduleRepository,
    ScheduleService, ScheduleStatus, ServiceError, SystemClock, TaskService,
};
use chrono::Duration;
use clap::Args;
use log::info;
use rusqlite::Connection;

use crate::{print_json, store};

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Caregiver owning the demo schedules.
    #[arg(long, default_value = "1")]
    pub caregiver_id: i64,
}

struct DemoClient {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
    zip_code: &'static str,
    latitude: f64,
    longitude: f64,
    notes: &'static str,
}

struct DemoSchedule {
    client: usize,
    service_name: &'static str,
    starts_in: Duration,
    length: Duration,
    status: ScheduleStatus,
    notes: &'static str,
    tasks: &'static [(&'static str, &'static str)],
}

const DEMO_CLIENTS: [DemoClient; 4] = [
    DemoClient {
        name: "John Smith",
        email: "john.smith@email.com",
        phone: "+44 1232 212 3233",
        address: "123 Main St",
        zip_code: "62701",
        latitude: 39.7817,
        longitude: -89.6501,
        notes: "Prefers morning visits",
    },
    DemoClient {
        name: "Mary Johnson",
        email: "mary.johnson@email.com",
        phone: "+44 1232 212 3234",
        address: "456 Oak Ave",
        zip_code: "62702",
        latitude: 39.7990,
        longitude: -89.6440,
        notes: "Needs medication assistance",
    },
    DemoClient {
        name: "Robert Brown",
        email: "robert.brown@email.com",
        phone: "+44 1232 212 3235",
        address: "789 Pine Rd",
        zip_code: "62703",
        latitude: 39.7665,
        longitude: -89.6808,
        notes: "Companionship service client",
    },
    DemoClient {
        name: "Sarah Davis",
        email: "sarah.davis@email.com",
        phone: "+44 1232 212 3236",
        address: "321 Elm St",
        zip_code: "62701",
        latitude: 39.7817,
        longitude: -89.6501,
        notes: "Physical therapy client",
    },
];

fn demo_schedules() -> [DemoSchedule; 5] {
    [
        DemoSchedule {
            client: 0,
            service_name: "Personal Care Service",
            starts_in: Duration::hours(1),
            length: Duration::hours(2),
            status: ScheduleStatus::Scheduled,
            notes: "Regular morning visit",
            tasks: &[
                ("Give medication", "Administer morning medications as prescribed"),
                ("Check vital signs", "Take blood pressure and temperature"),
                ("Assist with bathing", "Help client with personal hygiene"),
            ],
        },
        DemoSchedule {
            client: 1,
            service_name: "Medication Management",
            starts_in: Duration::hours(4),
            length: Duration::hours(2),
            status: ScheduleStatus::Scheduled,
            notes: "Afternoon medication assistance",
            tasks: &[
                ("Prepare lunch", "Prepare and serve nutritious lunch"),
                ("Light housekeeping", "Tidy up living areas"),
            ],
        },
        DemoSchedule {
            client: 2,
            service_name: "Companionship Service",
            starts_in: Duration::hours(-3),
            length: Duration::hours(2),
            status: ScheduleStatus::Scheduled,
            notes: "Window already elapsed",
            tasks: &[],
        },
        DemoSchedule {
            client: 1,
            service_name: "Medication Management",
            starts_in: Duration::hours(-26),
            length: Duration::hours(2),
            status: ScheduleStatus::Missed,
            notes: "Client was not home",
            tasks: &[],
        },
        DemoSchedule {
            client: 3,
            service_name: "Personal Care Service",
            starts_in: Duration::hours(26),
            length: Duration::hours(2),
            status: ScheduleStatus::Scheduled,
            notes: "Tomorrow morning visit",
            tasks: &[
                ("Physical therapy exercises", "Guide client through prescribed exercises"),
                ("Medication review", "Review medication schedule with client"),
            ],
        },
    ]
}

/// Execute the seed command.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn execute(args: &SeedArgs, conn: &Connection) -> Result<()> {
    let store = store(conn)?;
    let clock = SystemClock;
    let clients = ClientService::new(store);
    let schedules = ScheduleService::new(store, clock);
    let tasks = TaskService::new(store, clock, RetryPolicy::default());

    let mut client_ids = Vec::with_capacity(DEMO_CLIENTS.len());
    for demo in &DEMO_CLIENTS {
        let client = clients.create_client(&NewClient {
            name: demo.name.to_string(),
            email: demo.email.to_string(),
            phone: demo.phone.to_string(),
            address: demo.address.to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: demo.zip_code.to_string(),
            latitude: demo.latitude,
            longitude: demo.longitude,
            notes: demo.notes.to_string(),
        })?;
        client_ids.push(client.id);
    }

    let now = clock.now();
    let mut schedule_ids = Vec::new();
    let mut task_count = 0;
    for demo in demo_schedules() {
        let start_time = now + demo.starts_in;
        let mut schedule = schedules.create_schedule(&NewSchedule {
            client_id: client_ids[demo.client],
            caregiver_id: args.caregiver_id,
            service_name: demo.service_name.to_string(),
            start_time,
            end_time: start_time + demo.length,
            notes: demo.notes.to_string(),
        })?;

        if schedule.status != demo.status {
            schedule.status = demo.status;
            store
                .update_schedule(&schedule)
                .map_err(ServiceError::from)?;
        }

        for (title, description) in demo.tasks {
            tasks.create_task(&NewTask {
                schedule_id: schedule.id,
                title: (*title).to_string(),
                description: (*description).to_string(),
            })?;
            task_count += 1;
        }
        schedule_ids.push(schedule.id);
    }

    info!(
        "event=seed_demo module=cli status=ok clients={} schedules={} tasks={}",
        client_ids.len(),
        schedule_ids.len(),
        task_count
    );
    print_json(&serde_json::json!({
        "clients": client_ids,
        "schedules": schedule_ids,
        "tasks": task_count,
    }))
}
