//! Import batch models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MediaReference;

/// An import lot of physical gold bars, purchased as a weight/count mix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    /// Display name (e.g., "28-1")
    pub name: String,
    pub acquisition_date: NaiveDate,
    /// Year label used for grouping in reports (e.g., "2028")
    pub year_label: String,
    /// As-purchased composition; immutable once any bar has been allocated
    pub composition: Vec<CompositionLine>,
    pub price_per_gram: Option<Decimal>,
    /// Supplier invoice document, stored externally
    pub invoice: Option<MediaReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One weight class of a batch composition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompositionLine {
    pub weight_grams: Decimal,
    pub count: u32,
}

impl Batch {
    /// Total purchased weight across all weight classes, in grams
    pub fn total_weight_grams(&self) -> Decimal {
        self.composition
            .iter()
            .map(|line| line.weight_grams * Decimal::from(line.count))
            .sum()
    }

    /// Purchased count for one weight class, zero if absent
    pub fn purchased_count(&self, weight_grams: Decimal) -> u32 {
        self.composition
            .iter()
            .find(|line| line.weight_grams == weight_grams)
            .map_or(0, |line| line.count)
    }
}
