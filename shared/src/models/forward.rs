//! Forward commitment ("futura") models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Settlement;

/// A sale agreed before physical stock exists
///
/// Lives outside any delivery. Consumed (deleted) oldest-first the moment a
/// delivery is created for the same client and weight class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardCommitment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub weight_grams: Decimal,
    /// None means sold but not yet priced
    pub settlement: Option<Settlement>,
    /// Only meaningful once the commitment has been priced
    pub paid: bool,
    /// FIFO ordering key
    pub created_at: DateTime<Utc>,
}

impl ForwardCommitment {
    pub fn new(client_id: Uuid, weight_grams: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            weight_grams,
            settlement: None,
            paid: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_priced(&self) -> bool {
        self.settlement.is_some()
    }
}
