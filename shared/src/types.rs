//! Common projection and request types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One requested line of a delivery: how many bars of a given weight class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestedItem {
    pub weight_grams: Decimal,
    pub count: u32,
}

/// Remaining free stock for one weight class of one batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLine {
    pub weight_grams: Decimal,
    pub count: i64,
}

/// Aggregated stock for one weight class across every batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStockLine {
    pub weight_grams: Decimal,
    pub count: i64,
    pub per_batch: Vec<BatchStockShare>,
}

/// Contribution of a single batch to a global stock line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStockShare {
    pub batch_id: Uuid,
    pub batch_name: String,
    pub count: i64,
}

/// Reference to a bar inside a delivery, used by bulk operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct BarRef {
    pub delivery_id: Uuid,
    pub bar_index: usize,
}

/// Media reference for invoice documents and other attachments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaReference {
    pub id: Uuid,
    pub url: String,
    pub original_filename: Option<String>,
    pub content_type: Option<String>,
}
