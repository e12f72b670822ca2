//! Forward commitment ("futura") service
//!
//! A forward commitment records a sale made while physical stock was short.
//! It is consumed automatically by delivery creation (see the FIFO
//! matcher); here it can also be priced, paid and cancelled directly.
//! Commitments live outside any delivery, so their audit trail is the
//! system log rather than a delivery log.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{validate_gram_price, validate_margin_percent, validate_spot_price, ForwardCommitment};

use crate::error::{AppError, AppResult};
use crate::services::settlement::{self, SettlementInput};
use crate::store::{CommitmentFilter, Store};

/// Forward commitment lifecycle operations
#[derive(Clone)]
pub struct ForwardService {
    store: Arc<dyn Store>,
}

impl ForwardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record a sale made beyond physical stock
    pub async fn create_commitment(
        &self,
        client_id: Uuid,
        weight_grams: Decimal,
        actor: &str,
    ) -> AppResult<ForwardCommitment> {
        if weight_grams <= Decimal::ZERO {
            return Err(AppError::validation(
                "weight_grams",
                "Weight must be positive",
                "El peso debe ser positivo",
            ));
        }
        // the client must exist before committing stock to it
        let client = self.store.get_client(client_id).await?;

        let commitment = ForwardCommitment::new(client_id, weight_grams);
        self.store.insert_commitment(&commitment).await?;

        tracing::info!(
            commitment_id = %commitment.id,
            client = %client.name,
            weight_grams = %weight_grams,
            actor,
            "forward commitment created"
        );
        Ok(commitment)
    }

    /// Pending commitments of one client, oldest first (FIFO order)
    pub async fn pending_for_client(&self, client_id: Uuid) -> AppResult<Vec<ForwardCommitment>> {
        let mut commitments = self
            .store
            .list_commitments(&CommitmentFilter {
                client_id: Some(client_id),
            })
            .await?;
        commitments.sort_by_key(|c| c.created_at);
        Ok(commitments)
    }

    /// Price a commitment directly, before any physical bar exists
    ///
    /// The settlement snapshot is carried verbatim onto the bar that later
    /// materializes this commitment.
    pub async fn close_commitment(
        &self,
        commitment_id: Uuid,
        input: SettlementInput,
        actor: &str,
    ) -> AppResult<ForwardCommitment> {
        validate_spot_price(input.spot_price_per_ounce).map_err(|msg| {
            AppError::validation("spot_price_per_ounce", msg, "Precio spot no válido")
        })?;
        validate_gram_price(input.client_base_price_per_gram).map_err(|msg| {
            AppError::validation("client_base_price_per_gram", msg, "Precio base no válido")
        })?;
        validate_gram_price(input.reference_cost_price_per_gram).map_err(|msg| {
            AppError::validation("reference_cost_price_per_gram", msg, "Precio de coste no válido")
        })?;
        validate_margin_percent(input.margin_percent)
            .map_err(|msg| AppError::validation("margin_percent", msg, "Margen no válido"))?;

        let mut commitment = self.store.get_commitment(commitment_id).await?;
        if commitment.is_priced() {
            return Err(AppError::InvalidStateTransition(
                "forward commitment is already priced".to_string(),
            ));
        }

        commitment.settlement = Some(settlement::settle(&input, commitment.weight_grams));
        commitment.paid = false;
        self.store.update_commitment(&commitment).await?;

        tracing::info!(
            commitment_id = %commitment.id,
            weight_grams = %commitment.weight_grams,
            actor,
            "forward commitment priced"
        );
        Ok(commitment)
    }

    pub async fn mark_paid(&self, commitment_id: Uuid, actor: &str) -> AppResult<ForwardCommitment> {
        self.set_paid(commitment_id, true, actor).await
    }

    pub async fn unmark_paid(
        &self,
        commitment_id: Uuid,
        actor: &str,
    ) -> AppResult<ForwardCommitment> {
        self.set_paid(commitment_id, false, actor).await
    }

    async fn set_paid(
        &self,
        commitment_id: Uuid,
        paid: bool,
        actor: &str,
    ) -> AppResult<ForwardCommitment> {
        let mut commitment = self.store.get_commitment(commitment_id).await?;
        if !commitment.is_priced() {
            return Err(AppError::InvalidStateTransition(
                "an unpriced forward commitment cannot change payment state".to_string(),
            ));
        }

        commitment.paid = paid;
        self.store.update_commitment(&commitment).await?;

        tracing::info!(commitment_id = %commitment.id, paid, actor, "forward commitment payment toggled");
        Ok(commitment)
    }

    /// Cancel a commitment that will never be delivered
    pub async fn delete_commitment(&self, commitment_id: Uuid, actor: &str) -> AppResult<()> {
        let commitment = self.store.get_commitment(commitment_id).await?;
        self.store.delete_commitment(commitment_id).await?;

        tracing::info!(
            commitment_id = %commitment.id,
            weight_grams = %commitment.weight_grams,
            actor,
            "forward commitment cancelled"
        );
        Ok(())
    }
}
