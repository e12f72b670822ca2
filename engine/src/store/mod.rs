//! Persistence contract for the Gold Bar Inventory Engine
//!
//! The engine only assumes per-entity CRUD primitives: create, get, list,
//! update, delete. No multi-document transaction is offered or required;
//! multi-step operations in the services are explicit sagas.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use shared::{Batch, Client, Delivery, ForwardCommitment};

use crate::error::AppResult;

/// Filter for delivery listings
#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
    pub batch_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

/// Filter for forward commitment listings
#[derive(Debug, Clone, Default)]
pub struct CommitmentFilter {
    pub client_id: Option<Uuid>,
}

/// Document store contract the engine is driven against
///
/// Updates replace the whole document; an implementation is free to diff
/// internally. `get_*` of an absent id is a `NotFound` error.
#[async_trait]
pub trait Store: Send + Sync {
    // ===== Batches =====
    async fn insert_batch(&self, batch: &Batch) -> AppResult<Uuid>;
    async fn get_batch(&self, id: Uuid) -> AppResult<Batch>;
    async fn list_batches(&self) -> AppResult<Vec<Batch>>;
    async fn update_batch(&self, batch: &Batch) -> AppResult<()>;
    async fn delete_batch(&self, id: Uuid) -> AppResult<()>;

    // ===== Deliveries =====
    async fn insert_delivery(&self, delivery: &Delivery) -> AppResult<Uuid>;
    async fn get_delivery(&self, id: Uuid) -> AppResult<Delivery>;
    async fn list_deliveries(&self, filter: &DeliveryFilter) -> AppResult<Vec<Delivery>>;
    async fn update_delivery(&self, delivery: &Delivery) -> AppResult<()>;
    async fn delete_delivery(&self, id: Uuid) -> AppResult<()>;

    // ===== Forward commitments =====
    async fn insert_commitment(&self, commitment: &ForwardCommitment) -> AppResult<Uuid>;
    async fn get_commitment(&self, id: Uuid) -> AppResult<ForwardCommitment>;
    async fn list_commitments(&self, filter: &CommitmentFilter)
        -> AppResult<Vec<ForwardCommitment>>;
    async fn update_commitment(&self, commitment: &ForwardCommitment) -> AppResult<()>;
    async fn delete_commitment(&self, id: Uuid) -> AppResult<()>;

    // ===== Clients =====
    async fn insert_client(&self, client: &Client) -> AppResult<Uuid>;
    async fn get_client(&self, id: Uuid) -> AppResult<Client>;
    async fn list_clients(&self) -> AppResult<Vec<Client>>;
}
