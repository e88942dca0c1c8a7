//! Client registration and lookup.

use common::ClientId;

use crate::error::DomainError;
use crate::ports::{ClientRepository, RepositoryError};

use super::{Client, Cpf, NewClient};

/// Service resolving client identifiers for the order use cases.
pub struct ClientService<R: ClientRepository> {
    repository: R,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Registers a client. Fails with `ClientAlreadyExists` on a known CPF.
    #[tracing::instrument(skip(self, client), fields(cpf = %client.cpf))]
    pub async fn register_client(&self, client: NewClient) -> Result<Client, DomainError> {
        if self
            .repository
            .find_client_by_cpf(&client.cpf)
            .await?
            .is_some()
        {
            return Err(DomainError::ClientAlreadyExists(client.cpf.to_string()));
        }

        let cpf = client.cpf.to_string();
        let client = self
            .repository
            .save_client(client)
            .await
            .map_err(|err| match err {
                RepositoryError::Duplicate(_) => DomainError::ClientAlreadyExists(cpf),
                other => DomainError::Repository(other),
            })?;

        tracing::info!(client_id = %client.id, "client registered");
        Ok(client)
    }

    /// Resolves a client id. Fails with `ClientNotFound` when absent.
    #[tracing::instrument(skip(self))]
    pub async fn find_client_by_id(&self, id: ClientId) -> Result<Client, DomainError> {
        self.repository
            .find_client_by_id(id)
            .await?
            .ok_or(DomainError::ClientNotFound(id))
    }

    /// Identifies a client by CPF.
    #[tracing::instrument(skip(self))]
    pub async fn identify_client(&self, cpf: &str) -> Result<Client, DomainError> {
        let cpf = Cpf::parse(cpf)?;
        self.repository
            .find_client_by_cpf(&cpf)
            .await?
            .ok_or_else(|| DomainError::ClientNotFoundByCpf(cpf.to_string()))
    }
}
