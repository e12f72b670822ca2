//! Delivery (consignment) models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Bar, BarState};

/// A consignment of bars handed to one client, drawn from one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Source batch whose stock this delivery consumes
    pub batch_id: Uuid,
    pub delivery_date: NaiveDate,
    pub bars: Vec<Bar>,
    /// Append-only audit trail; entries are never edited or removed
    pub log: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category of an audit-log entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Delivery,
    Close,
    Return,
    CancelReturn,
    Payment,
}

/// One audit-log entry on a delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub category: LogCategory,
    pub description: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

impl Delivery {
    /// Append an audit entry; the log is append-only by convention
    pub fn append_log(&mut self, category: LogCategory, description: String, actor: &str) {
        self.log.push(LogEntry {
            id: Uuid::new_v4(),
            category,
            description,
            actor: actor.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// A delivery is open unless every bar is returned, or settled with an
    /// invoice reference on file
    pub fn is_open(&self) -> bool {
        !self.bars.iter().all(|bar| match &bar.state {
            BarState::Returned { .. } => true,
            BarState::Settled(s) => s.invoice_ref.is_some(),
            _ => false,
        })
    }
}
