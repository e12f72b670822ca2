//! Batch management service
//!
//! Owns the purchased composition of each import batch. A composition is
//! freely editable only while no delivery references the batch, and a
//! batch can only be deleted under the same condition.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{validate_composition, Batch, CompositionLine, MediaReference};

use crate::error::{AppError, AppResult};
use crate::store::{DeliveryFilter, Store};

/// Batch CRUD with consumption guards
#[derive(Clone)]
pub struct BatchService {
    store: Arc<dyn Store>,
}

/// Input for registering a new import batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatchInput {
    pub name: String,
    pub acquisition_date: NaiveDate,
    pub year_label: String,
    pub composition: Vec<CompositionLine>,
    pub price_per_gram: Option<Decimal>,
}

impl BatchService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_batch(&self, input: CreateBatchInput) -> AppResult<Batch> {
        validate_composition(&input.composition).map_err(|msg| {
            AppError::validation("composition", msg, "Composición de lote no válida")
        })?;

        let now = Utc::now();
        let batch = Batch {
            id: Uuid::new_v4(),
            name: input.name,
            acquisition_date: input.acquisition_date,
            year_label: input.year_label,
            composition: input.composition,
            price_per_gram: input.price_per_gram,
            invoice: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_batch(&batch).await?;

        tracing::info!(batch_id = %batch.id, name = %batch.name, "batch created");
        Ok(batch)
    }

    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<Batch> {
        self.store.get_batch(batch_id).await
    }

    pub async fn list_batches(&self) -> AppResult<Vec<Batch>> {
        self.store.list_batches().await
    }

    /// Replace the purchased composition
    ///
    /// Only legal while no delivery references the batch. Returned bars
    /// still count as allocations here: shrinking the purchase under them
    /// would let a later cancelled return drive availability negative.
    pub async fn update_composition(
        &self,
        batch_id: Uuid,
        composition: Vec<CompositionLine>,
    ) -> AppResult<Batch> {
        validate_composition(&composition).map_err(|msg| {
            AppError::validation("composition", msg, "Composición de lote no válida")
        })?;

        let mut batch = self.store.get_batch(batch_id).await?;
        if self.is_referenced(batch_id).await? {
            return Err(AppError::Conflict {
                resource: "Batch".to_string(),
                message: "Composition cannot change once bars have been allocated".to_string(),
                message_es: "La composición no puede cambiar una vez asignadas barras".to_string(),
            });
        }

        batch.composition = composition;
        batch.updated_at = Utc::now();
        self.store.update_batch(&batch).await?;

        tracing::info!(batch_id = %batch.id, "batch composition updated");
        Ok(batch)
    }

    pub async fn set_price_per_gram(
        &self,
        batch_id: Uuid,
        price_per_gram: Option<Decimal>,
    ) -> AppResult<Batch> {
        if let Some(price) = price_per_gram {
            if price <= Decimal::ZERO {
                return Err(AppError::validation(
                    "price_per_gram",
                    "Price per gram must be positive",
                    "El precio por gramo debe ser positivo",
                ));
            }
        }
        let mut batch = self.store.get_batch(batch_id).await?;
        batch.price_per_gram = price_per_gram;
        batch.updated_at = Utc::now();
        self.store.update_batch(&batch).await?;
        Ok(batch)
    }

    /// Attach (or replace) the supplier invoice document reference
    pub async fn attach_invoice(
        &self,
        batch_id: Uuid,
        invoice: MediaReference,
    ) -> AppResult<Batch> {
        let mut batch = self.store.get_batch(batch_id).await?;
        batch.invoice = Some(invoice);
        batch.updated_at = Utc::now();
        self.store.update_batch(&batch).await?;

        tracing::info!(batch_id = %batch.id, "invoice attached to batch");
        Ok(batch)
    }

    /// Delete a batch; only legal while untouched (no delivery references it)
    pub async fn delete_batch(&self, batch_id: Uuid) -> AppResult<()> {
        // get first so an unknown id surfaces as NotFound, not Conflict
        let batch = self.store.get_batch(batch_id).await?;
        if self.is_referenced(batch_id).await? {
            return Err(AppError::Conflict {
                resource: "Batch".to_string(),
                message: "Batch is referenced by deliveries and cannot be deleted".to_string(),
                message_es: "El lote tiene entregas asociadas y no puede eliminarse".to_string(),
            });
        }

        self.store.delete_batch(batch_id).await?;
        tracing::info!(batch_id = %batch.id, name = %batch.name, "batch deleted");
        Ok(())
    }

    /// Whether any delivery draws on this batch
    async fn is_referenced(&self, batch_id: Uuid) -> AppResult<bool> {
        let deliveries = self
            .store
            .list_deliveries(&DeliveryFilter {
                batch_id: Some(batch_id),
                ..Default::default()
            })
            .await?;
        Ok(!deliveries.is_empty())
    }
}
