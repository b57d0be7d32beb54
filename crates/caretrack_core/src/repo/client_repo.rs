//! Client repository contract and SQLite implementation.
//!
//! # Invariants
//! - Lists are ordered by `name ASC, id ASC`.
//! - A client referenced by any schedule cannot be deleted.

use crate::model::client::{Client, NewClient};
use crate::model::ClientId;
use crate::repo::codec::{bool_to_int, from_millis, int_to_bool};
use crate::repo::{Entity, RepoError, RepoResult, SqliteStore};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    phone,
    address,
    city,
    state,
    zip_code,
    latitude,
    longitude,
    notes,
    is_active,
    created_at,
    updated_at
FROM clients";

/// Query options for listing clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientListQuery {
    pub is_active: Option<bool>,
    /// Case-insensitive exact match.
    pub city: Option<String>,
    /// Case-insensitive exact match.
    pub state: Option<String>,
    /// Substring of name or email (case-insensitive) or phone.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for client records.
pub trait ClientRepository {
    fn create_client(&self, client: &NewClient) -> RepoResult<Client>;
    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>>;
    fn update_client(&self, client: &Client) -> RepoResult<()>;
    fn list_clients(&self, query: &ClientListQuery) -> RepoResult<Vec<Client>>;
    fn delete_client(&self, id: ClientId) -> RepoResult<()>;
}

impl<R: ClientRepository + ?Sized> ClientRepository for &R {
    fn create_client(&self, client: &NewClient) -> RepoResult<Client> {
        (**self).create_client(client)
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        (**self).get_client(id)
    }

    fn update_client(&self, client: &Client) -> RepoResult<()> {
        (**self).update_client(client)
    }

    fn list_clients(&self, query: &ClientListQuery) -> RepoResult<Vec<Client>> {
        (**self).list_clients(query)
    }

    fn delete_client(&self, id: ClientId) -> RepoResult<()> {
        (**self).delete_client(id)
    }
}

impl ClientRepository for SqliteStore<'_> {
    fn create_client(&self, client: &NewClient) -> RepoResult<Client> {
        client.validate()?;

        self.conn().execute(
            "INSERT INTO clients (
                name,
                email,
                phone,
                address,
                city,
                state,
                zip_code,
                latitude,
                longitude,
                notes,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1);",
            params![
                client.name.trim(),
                client.email.trim(),
                client.phone.trim(),
                client.address.trim(),
                client.city.trim(),
                client.state.trim(),
                client.zip_code.trim(),
                client.latitude,
                client.longitude,
                client.notes.as_str(),
            ],
        )?;

        let id = self.conn().last_insert_rowid();
        load_client(self.conn(), id)?.ok_or(RepoError::NotFound {
            entity: Entity::Client,
            id,
        })
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        load_client(self.conn(), id)
    }

    fn update_client(&self, client: &Client) -> RepoResult<()> {
        client.validate()?;

        let changed = self.conn().execute(
            "UPDATE clients
             SET
                name = ?1,
                email = ?2,
                phone = ?3,
                address = ?4,
                city = ?5,
                state = ?6,
                zip_code = ?7,
                latitude = ?8,
                longitude = ?9,
                notes = ?10,
                is_active = ?11,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?12;",
            params![
                client.name.trim(),
                client.email.trim(),
                client.phone.trim(),
                client.address.trim(),
                client.city.trim(),
                client.state.trim(),
                client.zip_code.trim(),
                client.latitude,
                client.longitude,
                client.notes.as_str(),
                bool_to_int(client.is_active),
                client.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Client,
                id: client.id,
            });
        }

        Ok(())
    }

    fn list_clients(&self, query: &ClientListQuery) -> RepoResult<Vec<Client>> {
        let mut sql = format!("{CLIENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(is_active) = query.is_active {
            sql.push_str(" AND is_active = ?");
            bind_values.push(Value::Integer(bool_to_int(is_active)));
        }

        if let Some(city) = non_blank(query.city.as_deref()) {
            sql.push_str(" AND LOWER(city) = LOWER(?)");
            bind_values.push(Value::Text(city.to_string()));
        }

        if let Some(state) = non_blank(query.state.as_deref()) {
            sql.push_str(" AND LOWER(state) = LOWER(?)");
            bind_values.push(Value::Text(state.to_string()));
        }

        if let Some(search) = non_blank(query.search.as_deref()) {
            let pattern = format!("%{}%", escape_like(search));
            sql.push_str(
                " AND (LOWER(name) LIKE LOWER(?) ESCAPE '\\' \
                 OR LOWER(email) LIKE LOWER(?) ESCAPE '\\' \
                 OR phone LIKE ? ESCAPE '\\')",
            );
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern));
        }

        sql.push_str(" ORDER BY name ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut clients = Vec::new();

        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }

        Ok(clients)
    }

    fn delete_client(&self, id: ClientId) -> RepoResult<()> {
        let exists = self
            .conn()
            .query_row("SELECT 1 FROM clients WHERE id = ?1;", [id], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::NotFound {
                entity: Entity::Client,
                id,
            });
        }

        let schedule_count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM schedules WHERE client_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        if schedule_count > 0 {
            return Err(RepoError::Conflict(format!(
                "client {id} is referenced by {schedule_count} schedule(s)"
            )));
        }

        self.conn()
            .execute("DELETE FROM clients WHERE id = ?1;", [id])?;
        Ok(())
    }
}

/// Escapes LIKE wildcards so search text matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn load_client(conn: &Connection, id: ClientId) -> RepoResult<Option<Client>> {
    let mut stmt = conn.prepare(&format!("{CLIENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_client_row(row)?));
    }
    Ok(None)
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    Ok(Client {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        address: row.get("address")?,
        city: row.get("city")?,
        state: row.get("state")?,
        zip_code: row.get("zip_code")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        notes: row.get("notes")?,
        is_active: int_to_bool(row.get("is_active")?, "clients.is_active")?,
        created_at: from_millis(row.get("created_at")?, "clients.created_at")?,
        updated_at: from_millis(row.get("updated_at")?, "clients.updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_guards_wildcards_and_escape_char() {
        assert_eq!(escape_like("john"), "john");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
