//! Batch ledger: stock availability projections
//!
//! Availability is recomputed on demand from the two source collections
//! (batches and deliveries) instead of a stored counter, so it cannot
//! drift. Allocation decisions are always per batch; the global view is
//! for display and aggregate checks only.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{Batch, BatchStockShare, Delivery, GlobalStockLine, StockLine};

use crate::error::AppResult;
use crate::store::{DeliveryFilter, Store};

/// Read-side stock calculator
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn Store>,
}

/// Count of bars still consuming stock for one weight class of one batch
fn consumed_count(deliveries: &[Delivery], weight_grams: Decimal) -> i64 {
    deliveries
        .iter()
        .flat_map(|d| d.bars.iter())
        .filter(|bar| bar.weight_grams == weight_grams && bar.consumes_stock())
        .count() as i64
}

/// Purchased composition minus non-returned bars, per weight class
fn availability_of(batch: &Batch, deliveries: &[Delivery]) -> Vec<StockLine> {
    batch
        .composition
        .iter()
        .map(|line| StockLine {
            weight_grams: line.weight_grams,
            count: i64::from(line.count) - consumed_count(deliveries, line.weight_grams),
        })
        .collect()
}

impl StockService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Remaining free stock of one batch, per weight class
    ///
    /// Returned bars count back toward availability. Unknown batch ids
    /// surface as `NotFound`.
    pub async fn availability(&self, batch_id: Uuid) -> AppResult<Vec<StockLine>> {
        let batch = self.store.get_batch(batch_id).await?;
        let deliveries = self
            .store
            .list_deliveries(&DeliveryFilter {
                batch_id: Some(batch_id),
                ..Default::default()
            })
            .await?;
        Ok(availability_of(&batch, &deliveries))
    }

    /// Free stock of one batch for a single weight class
    pub async fn availability_for_weight(
        &self,
        batch_id: Uuid,
        weight_grams: Decimal,
    ) -> AppResult<i64> {
        let lines = self.availability(batch_id).await?;
        Ok(lines
            .iter()
            .find(|line| line.weight_grams == weight_grams)
            .map_or(0, |line| line.count))
    }

    /// Union of availability over all batches, with per-batch breakdown
    pub async fn global_stock(&self) -> AppResult<Vec<GlobalStockLine>> {
        let batches = self.store.list_batches().await?;
        let mut lines: Vec<GlobalStockLine> = Vec::new();

        for batch in &batches {
            let deliveries = self
                .store
                .list_deliveries(&DeliveryFilter {
                    batch_id: Some(batch.id),
                    ..Default::default()
                })
                .await?;
            for stock in availability_of(batch, &deliveries) {
                let share = BatchStockShare {
                    batch_id: batch.id,
                    batch_name: batch.name.clone(),
                    count: stock.count,
                };
                match lines
                    .iter_mut()
                    .find(|l| l.weight_grams == stock.weight_grams)
                {
                    Some(line) => {
                        line.count += stock.count;
                        line.per_batch.push(share);
                    }
                    None => lines.push(GlobalStockLine {
                        weight_grams: stock.weight_grams,
                        count: stock.count,
                        per_batch: vec![share],
                    }),
                }
            }
        }

        lines.sort_by_key(|line| line.weight_grams);
        Ok(lines)
    }
}
