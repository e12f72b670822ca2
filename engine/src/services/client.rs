//! Client registry service

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shared::{Client, RegisterClientInput};

use crate::error::{AppError, AppResult};
use crate::store::Store;

/// Minimal client registry the deliveries and commitments reference
#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn Store>,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn register_client(&self, input: RegisterClientInput) -> AppResult<Client> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation(
                "name",
                "Client name is required",
                "El nombre del cliente es obligatorio",
            ));
        }

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_client(&client).await?;

        tracing::info!(client_id = %client.id, name = %client.name, "client registered");
        Ok(client)
    }

    pub async fn get_client(&self, client_id: Uuid) -> AppResult<Client> {
        self.store.get_client(client_id).await
    }

    pub async fn list_clients(&self) -> AppResult<Vec<Client>> {
        self.store.list_clients().await
    }
}
