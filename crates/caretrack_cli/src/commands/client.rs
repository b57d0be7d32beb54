//! Client commands.

use anyhow::Result;
use caretrack_core::{ClientListQuery, ClientPatch, ClientService, NewClient};
use clap::{Args, Subcommand};
use rusqlite::Connection;

use crate::{print_json, store};

/// Client subcommands.
#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Register a client.
    Add(AddClientArgs),
    /// Change fields of a client.
    Update(UpdateClientArgs),
    /// List clients.
    List(ListClientArgs),
    /// Show one client.
    Show {
        id: i64,
    },
    /// Search by name, email or phone.
    Search {
        query: String,
    },
    /// Delete a client without schedules.
    Delete {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct AddClientArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub zip_code: String,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Debug, Args)]
pub struct UpdateClientArgs {
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub zip_code: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Mark the client active or inactive.
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Debug, Args)]
pub struct ListClientArgs {
    #[arg(long)]
    pub active: Option<bool>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, default_value = "0")]
    pub offset: u32,
}

/// Execute a client subcommand.
///
/// # Errors
///
/// Returns an error if validation or storage fails.
pub fn execute(command: ClientCommand, conn: &Connection) -> Result<()> {
    let service = ClientService::new(store(conn)?);

    match command {
        ClientCommand::Add(args) => {
            let request = NewClient {
                name: args.name,
                email: args.email,
                phone: args.phone,
                address: args.address,
                city: args.city,
                state: args.state,
                zip_code: args.zip_code,
                latitude: args.latitude,
                longitude: args.longitude,
                notes: args.notes,
            };
            print_json(&service.create_client(&request)?)
        }
        ClientCommand::Update(args) => {
            let patch = ClientPatch {
                name: args.name,
                email: args.email,
                phone: args.phone,
                address: args.address,
                city: args.city,
                state: args.state,
                zip_code: args.zip_code,
                latitude: args.latitude,
                longitude: args.longitude,
                notes: args.notes,
                is_active: args.active,
            };
            print_json(&service.update_client(args.id, &patch)?)
        }
        ClientCommand::List(args) => {
            let query = ClientListQuery {
                is_active: args.active,
                city: args.city,
                state: args.state,
                search: args.search,
                limit: args.limit,
                offset: args.offset,
            };
            print_json(&service.list_clients(&query)?)
        }
        ClientCommand::Show { id } => print_json(&service.get_client(id)?),
        ClientCommand::Search { query } => print_json(&service.search_clients(&query)?),
        ClientCommand::Delete { id } => {
            service.delete_client(id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
