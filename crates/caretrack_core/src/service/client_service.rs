//! Client registry service.

use crate::model::client::{Client, ClientPatch, NewClient};
use crate::model::ClientId;
use crate::repo::client_repo::{ClientListQuery, ClientRepository};
use crate::repo::Entity;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

pub struct ClientService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_client(&self, request: &NewClient) -> ServiceResult<Client> {
        let client = self.repo.create_client(request)?;
        info!(
            "event=client_create module=client status=ok client_id={}",
            client.id
        );
        Ok(client)
    }

    pub fn get_client(&self, id: ClientId) -> ServiceResult<Client> {
        self.repo
            .get_client(id)?
            .ok_or_else(|| ServiceError::not_found(Entity::Client, id))
    }

    /// Applies the present patch fields and returns the stored client.
    pub fn update_client(&self, id: ClientId, patch: &ClientPatch) -> ServiceResult<Client> {
        let mut client = self.get_client(id)?;
        client.apply(patch);
        self.repo.update_client(&client)?;
        info!("event=client_update module=client status=ok client_id={id}");
        self.get_client(id)
    }

    pub fn list_clients(&self, query: &ClientListQuery) -> ServiceResult<Vec<Client>> {
        Ok(self.repo.list_clients(query)?)
    }

    /// Name/email/phone substring search. A blank query matches nothing.
    pub fn search_clients(&self, query: &str) -> ServiceResult<Vec<Client>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.list_clients(&ClientListQuery {
            search: Some(query.to_string()),
            ..ClientListQuery::default()
        })
    }

    /// Deletes a client no schedule refers to.
    ///
    /// # Errors
    /// - `NotFound` when the client does not exist.
    /// - `Conflict` while schedules still reference the client.
    pub fn delete_client(&self, id: ClientId) -> ServiceResult<()> {
        self.repo.delete_client(id)?;
        info!("event=client_delete module=client status=ok client_id={id}");
        Ok(())
    }
}
