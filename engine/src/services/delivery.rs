//! Delivery orchestrator
//!
//! Composes the batch ledger, the FIFO matcher and the bar lifecycle to
//! create, close, return and bulk-close bars, and maintains the append-only
//! audit log of every delivery.
//!
//! The underlying store has no multi-document transactions. Multi-step
//! operations (delivery creation plus commitment deletion, bulk close
//! across deliveries) are explicit sagas: sub-operations run sequentially
//! in a deterministic order, progress is logged, and a failure partway
//! leaves the earlier steps applied. Callers reconcile by re-reading
//! `availability` and delivery state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{
    validate_devolution_grams, validate_gram_price, validate_margin_percent,
    validate_requested_items, validate_spot_price, BarRef, Delivery, LogCategory, RequestedItem,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::matcher::match_forward_commitments;
use crate::services::settlement::{self, PriceSuggestion, SettlementInput};
use crate::services::stock::StockService;
use crate::store::{CommitmentFilter, DeliveryFilter, Store};

/// Delivery lifecycle operations
#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn Store>,
    stock: StockService,
    config: Arc<Config>,
}

/// Input for creating a delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeliveryInput {
    pub client_id: Uuid,
    pub batch_id: Uuid,
    pub delivery_date: NaiveDate,
    pub items: Vec<RequestedItem>,
    pub actor: String,
}

impl DeliveryService {
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        let stock = StockService::new(store.clone());
        Self {
            store,
            stock,
            config,
        }
    }

    /// Create a delivery for one client out of one batch
    ///
    /// Availability is checked for every requested weight class before any
    /// mutation; if a single class is short, the whole call is rejected and
    /// nothing changes. Pending forward commitments of the client are then
    /// consumed oldest-first and deleted once the delivery is persisted.
    pub async fn create_delivery(&self, input: CreateDeliveryInput) -> AppResult<Delivery> {
        validate_requested_items(&input.items)
            .map_err(|msg| AppError::validation("items", msg, "Líneas de entrega no válidas"))?;
        self.store.get_client(input.client_id).await?;
        self.store.get_batch(input.batch_id).await?;

        // all-or-nothing stock pre-check
        let availability = self.stock.availability(input.batch_id).await?;
        for item in &input.items {
            let available = availability
                .iter()
                .find(|line| line.weight_grams == item.weight_grams)
                .map_or(0, |line| line.count);
            if available < i64::from(item.count) {
                return Err(AppError::InsufficientStock {
                    weight_grams: item.weight_grams,
                    requested: item.count,
                    available,
                });
            }
        }

        let pending = self
            .store
            .list_commitments(&CommitmentFilter {
                client_id: Some(input.client_id),
            })
            .await?;
        let outcome = match_forward_commitments(&input.items, &pending);

        let total_bars = outcome.bars.len();
        let total_weight: Decimal = outcome.bars.iter().map(|b| b.weight_grams).sum();
        let from_forward = outcome.forward_converted_count();

        let now = Utc::now();
        let mut delivery = Delivery {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            batch_id: input.batch_id,
            delivery_date: input.delivery_date,
            bars: outcome.bars,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        delivery.append_log(
            LogCategory::Delivery,
            format!(
                "Delivered {} bars ({}g total), {} from forward commitments",
                total_bars, total_weight, from_forward
            ),
            &input.actor,
        );
        self.store.insert_delivery(&delivery).await?;
        tracing::info!(
            delivery_id = %delivery.id,
            client_id = %delivery.client_id,
            batch_id = %delivery.batch_id,
            total_bars,
            from_forward,
            "delivery created"
        );

        // saga step 2: consumed commitments are deleted one by one; a
        // failure here leaves the delivery persisted and the remaining
        // commitments pending
        for commitment in &outcome.consumed {
            self.store.delete_commitment(commitment.id).await?;
            tracing::info!(
                delivery_id = %delivery.id,
                commitment_id = %commitment.id,
                "forward commitment consumed"
            );
        }

        Ok(delivery)
    }

    pub async fn get_delivery(&self, delivery_id: Uuid) -> AppResult<Delivery> {
        self.store.get_delivery(delivery_id).await
    }

    pub async fn deliveries_for_client(&self, client_id: Uuid) -> AppResult<Vec<Delivery>> {
        self.store
            .list_deliveries(&DeliveryFilter {
                client_id: Some(client_id),
                ..Default::default()
            })
            .await
    }

    /// Pre-fill suggestion for the close dialog, from the configured
    /// reference cost spread
    pub fn price_suggestion(&self, spot_price_per_ounce: Decimal) -> PriceSuggestion {
        settlement::suggest_prices(
            spot_price_per_ounce,
            self.config.pricing.reference_cost_spread,
        )
    }

    /// Close bars, possibly spanning several deliveries and clients
    ///
    /// The same operator-entered prices and the same uniform devolution
    /// grams apply to every targeted bar. Every ref and every state is
    /// validated before the first write; the per-delivery updates then run
    /// sequentially in ascending delivery-id order without rollback.
    pub async fn close_bars(
        &self,
        refs: &[BarRef],
        input: SettlementInput,
        actor: &str,
    ) -> AppResult<Vec<Delivery>> {
        validate_spot_price(input.spot_price_per_ounce).map_err(|msg| {
            AppError::validation("spot_price_per_ounce", msg, "Precio spot no válido")
        })?;
        validate_gram_price(input.client_base_price_per_gram).map_err(|msg| {
            AppError::validation("client_base_price_per_gram", msg, "Precio base no válido")
        })?;
        validate_gram_price(input.reference_cost_price_per_gram).map_err(|msg| {
            AppError::validation(
                "reference_cost_price_per_gram",
                msg,
                "Precio de coste no válido",
            )
        })?;
        validate_margin_percent(input.margin_percent)
            .map_err(|msg| AppError::validation("margin_percent", msg, "Margen no válido"))?;
        validate_devolution_grams(input.devolution_grams)
            .map_err(|msg| AppError::validation("devolution_grams", msg, "Devolución no válida"))?;
        if refs.is_empty() {
            return Err(AppError::validation(
                "refs",
                "At least one bar must be selected",
                "Debe seleccionarse al menos una barra",
            ));
        }

        // BTreeMap keeps the per-delivery update order deterministic
        let mut grouped: BTreeMap<Uuid, Vec<usize>> = BTreeMap::new();
        for bar_ref in refs {
            let indices = grouped.entry(bar_ref.delivery_id).or_default();
            if indices.contains(&bar_ref.bar_index) {
                return Err(AppError::validation(
                    "refs",
                    "Duplicate bar reference in close request",
                    "Referencia de barra duplicada",
                ));
            }
            indices.push(bar_ref.bar_index);
        }

        // load and validate everything before the first write
        let mut deliveries: Vec<(Delivery, Vec<usize>)> = Vec::with_capacity(grouped.len());
        for (delivery_id, indices) in grouped {
            let delivery = self.store.get_delivery(delivery_id).await?;
            for &index in &indices {
                let bar = delivery.bars.get(index).ok_or_else(|| {
                    AppError::NotFound(format!("Bar {index} in delivery {delivery_id}"))
                })?;
                if !bar.is_in_progress() {
                    return Err(AppError::InvalidStateTransition(format!(
                        "bar {index} in delivery {delivery_id} is {}, only in-progress bars close",
                        bar.state_name()
                    )));
                }
                if bar.weight_grams <= input.devolution_grams {
                    return Err(AppError::validation(
                        "devolution_grams",
                        "Devolution grams must be below every selected bar weight",
                        "La devolución debe ser inferior al peso de cada barra",
                    ));
                }
            }
            deliveries.push((delivery, indices));
        }

        let mut updated = Vec::with_capacity(deliveries.len());
        for (mut delivery, indices) in deliveries {
            let mut closed_weight = Decimal::ZERO;
            for &index in &indices {
                let bar = &mut delivery.bars[index];
                let settlement = settlement::settle(&input, bar.weight_grams);
                bar.close(settlement)?;
                closed_weight += bar.weight_grams;
            }
            delivery.append_log(
                LogCategory::Close,
                format!(
                    "Closed {} bars ({}g total) at {} {}/g",
                    indices.len(),
                    closed_weight,
                    settlement::client_price_per_gram(
                        input.client_base_price_per_gram,
                        input.margin_percent
                    ),
                    self.config.pricing.currency
                ),
                actor,
            );
            delivery.updated_at = Utc::now();
            self.store.update_delivery(&delivery).await?;
            tracing::info!(
                delivery_id = %delivery.id,
                closed = indices.len(),
                "bars closed"
            );
            updated.push(delivery);
        }

        Ok(updated)
    }

    /// Return bars still on consignment; releases their batch stock
    ///
    /// Fails before any mutation if a targeted bar is not in progress.
    pub async fn return_bars(
        &self,
        delivery_id: Uuid,
        bar_indices: &[usize],
        actor: &str,
    ) -> AppResult<Delivery> {
        if bar_indices.is_empty() {
            return Err(AppError::validation(
                "bar_indices",
                "At least one bar must be selected",
                "Debe seleccionarse al menos una barra",
            ));
        }

        let mut delivery = self.store.get_delivery(delivery_id).await?;
        for &index in bar_indices {
            let bar = delivery
                .bars
                .get(index)
                .ok_or_else(|| AppError::NotFound(format!("Bar {index} in delivery {delivery_id}")))?;
            if !bar.is_in_progress() {
                return Err(AppError::InvalidStateTransition(format!(
                    "bar {index} is {}, only in-progress bars can be returned",
                    bar.state_name()
                )));
            }
        }

        let now = Utc::now();
        let mut returned_weight = Decimal::ZERO;
        for &index in bar_indices {
            let bar = &mut delivery.bars[index];
            bar.record_return(now)?;
            returned_weight += bar.weight_grams;
        }
        delivery.append_log(
            LogCategory::Return,
            format!(
                "Returned {} bars ({}g total)",
                bar_indices.len(),
                returned_weight
            ),
            actor,
        );
        delivery.updated_at = now;
        self.store.update_delivery(&delivery).await?;

        tracing::info!(delivery_id = %delivery.id, returned = bar_indices.len(), "bars returned");
        Ok(delivery)
    }

    /// Undo a return; the bar consumes batch stock again
    pub async fn cancel_return(
        &self,
        delivery_id: Uuid,
        bar_index: usize,
        actor: &str,
    ) -> AppResult<Delivery> {
        let mut delivery = self.store.get_delivery(delivery_id).await?;
        let bar = delivery
            .bars
            .get_mut(bar_index)
            .ok_or_else(|| AppError::NotFound(format!("Bar {bar_index} in delivery {delivery_id}")))?;
        bar.cancel_return()?;
        let weight = bar.weight_grams;

        delivery.append_log(
            LogCategory::CancelReturn,
            format!("Cancelled return of 1 bar ({weight}g)"),
            actor,
        );
        delivery.updated_at = Utc::now();
        self.store.update_delivery(&delivery).await?;
        Ok(delivery)
    }

    pub async fn mark_paid(
        &self,
        delivery_id: Uuid,
        bar_index: usize,
        actor: &str,
    ) -> AppResult<Delivery> {
        self.toggle_paid(delivery_id, bar_index, true, actor).await
    }

    pub async fn unmark_paid(
        &self,
        delivery_id: Uuid,
        bar_index: usize,
        actor: &str,
    ) -> AppResult<Delivery> {
        self.toggle_paid(delivery_id, bar_index, false, actor).await
    }

    async fn toggle_paid(
        &self,
        delivery_id: Uuid,
        bar_index: usize,
        paid: bool,
        actor: &str,
    ) -> AppResult<Delivery> {
        let mut delivery = self.store.get_delivery(delivery_id).await?;
        let bar = delivery
            .bars
            .get_mut(bar_index)
            .ok_or_else(|| AppError::NotFound(format!("Bar {bar_index} in delivery {delivery_id}")))?;
        if paid {
            bar.mark_paid()?;
        } else {
            bar.unmark_paid()?;
        }
        let weight = bar.weight_grams;

        delivery.append_log(
            LogCategory::Payment,
            format!(
                "1 bar ({weight}g) {}",
                if paid { "marked paid" } else { "unmarked paid" }
            ),
            actor,
        );
        delivery.updated_at = Utc::now();
        self.store.update_delivery(&delivery).await?;
        Ok(delivery)
    }

    /// Delete a delivery; only legal while every bar is still in progress,
    /// which implicitly releases the consumed batch stock
    pub async fn delete_delivery(&self, delivery_id: Uuid) -> AppResult<()> {
        let delivery = self.store.get_delivery(delivery_id).await?;
        if !delivery.bars.iter().all(|bar| bar.is_in_progress()) {
            return Err(AppError::Conflict {
                resource: "Delivery".to_string(),
                message: "Only deliveries with every bar in progress can be deleted".to_string(),
                message_es: "Solo pueden eliminarse entregas con todas las barras en curso"
                    .to_string(),
            });
        }

        self.store.delete_delivery(delivery_id).await?;
        tracing::info!(delivery_id = %delivery.id, "delivery deleted, stock released");
        Ok(())
    }
}
