//! In-memory document store
//!
//! The bundled `Store` implementation, used by the test suite and as the
//! default for embedding. Behaves like the external document store the
//! engine targets: independent per-document writes, no transactions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::{Batch, Client, Delivery, ForwardCommitment};

use crate::error::{AppError, AppResult};

use super::{CommitmentFilter, DeliveryFilter, Store};

/// HashMap-backed store
#[derive(Default)]
pub struct MemoryStore {
    batches: RwLock<HashMap<Uuid, Batch>>,
    deliveries: RwLock<HashMap<Uuid, Delivery>>,
    commitments: RwLock<HashMap<Uuid, ForwardCommitment>>,
    clients: RwLock<HashMap<Uuid, Client>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_batch(&self, batch: &Batch) -> AppResult<Uuid> {
        self.batches.write().await.insert(batch.id, batch.clone());
        Ok(batch.id)
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<Batch> {
        self.batches
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }

    async fn list_batches(&self) -> AppResult<Vec<Batch>> {
        let mut batches: Vec<Batch> = self.batches.read().await.values().cloned().collect();
        batches.sort_by_key(|b| (b.acquisition_date, b.name.clone()));
        Ok(batches)
    }

    async fn update_batch(&self, batch: &Batch) -> AppResult<()> {
        let mut batches = self.batches.write().await;
        if !batches.contains_key(&batch.id) {
            return Err(AppError::NotFound("Batch".to_string()));
        }
        batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn delete_batch(&self, id: Uuid) -> AppResult<()> {
        self.batches
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }

    async fn insert_delivery(&self, delivery: &Delivery) -> AppResult<Uuid> {
        self.deliveries
            .write()
            .await
            .insert(delivery.id, delivery.clone());
        Ok(delivery.id)
    }

    async fn get_delivery(&self, id: Uuid) -> AppResult<Delivery> {
        self.deliveries
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Delivery".to_string()))
    }

    async fn list_deliveries(&self, filter: &DeliveryFilter) -> AppResult<Vec<Delivery>> {
        let mut deliveries: Vec<Delivery> = self
            .deliveries
            .read()
            .await
            .values()
            .filter(|d| filter.batch_id.map_or(true, |id| d.batch_id == id))
            .filter(|d| filter.client_id.map_or(true, |id| d.client_id == id))
            .cloned()
            .collect();
        deliveries.sort_by_key(|d| (d.delivery_date, d.created_at));
        Ok(deliveries)
    }

    async fn update_delivery(&self, delivery: &Delivery) -> AppResult<()> {
        let mut deliveries = self.deliveries.write().await;
        if !deliveries.contains_key(&delivery.id) {
            return Err(AppError::NotFound("Delivery".to_string()));
        }
        deliveries.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn delete_delivery(&self, id: Uuid) -> AppResult<()> {
        self.deliveries
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Delivery".to_string()))
    }

    async fn insert_commitment(&self, commitment: &ForwardCommitment) -> AppResult<Uuid> {
        self.commitments
            .write()
            .await
            .insert(commitment.id, commitment.clone());
        Ok(commitment.id)
    }

    async fn get_commitment(&self, id: Uuid) -> AppResult<ForwardCommitment> {
        self.commitments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Forward commitment".to_string()))
    }

    async fn list_commitments(
        &self,
        filter: &CommitmentFilter,
    ) -> AppResult<Vec<ForwardCommitment>> {
        let mut commitments: Vec<ForwardCommitment> = self
            .commitments
            .read()
            .await
            .values()
            .filter(|c| filter.client_id.map_or(true, |id| c.client_id == id))
            .cloned()
            .collect();
        commitments.sort_by_key(|c| c.created_at);
        Ok(commitments)
    }

    async fn update_commitment(&self, commitment: &ForwardCommitment) -> AppResult<()> {
        let mut commitments = self.commitments.write().await;
        if !commitments.contains_key(&commitment.id) {
            return Err(AppError::NotFound("Forward commitment".to_string()));
        }
        commitments.insert(commitment.id, commitment.clone());
        Ok(())
    }

    async fn delete_commitment(&self, id: Uuid) -> AppResult<()> {
        self.commitments
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Forward commitment".to_string()))
    }

    async fn insert_client(&self, client: &Client) -> AppResult<Uuid> {
        self.clients.write().await.insert(client.id, client.clone());
        Ok(client.id)
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Client> {
        self.clients
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Client".to_string()))
    }

    async fn list_clients(&self) -> AppResult<Vec<Client>> {
        let mut clients: Vec<Client> = self.clients.read().await.values().cloned().collect();
        clients.sort_by_key(|c| c.created_at);
        Ok(clients)
    }
}
