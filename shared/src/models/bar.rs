//! Bar lifecycle models
//!
//! A bar is one physical weight-class unit tracked inside a delivery. Its
//! settlement fields only exist once it has been closed, so the state is a
//! tagged union rather than a struct full of nullable fields.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a bar
///
/// `InProgress -> AwaitingPayment -> Settled` (payment toggles are
/// reversible), `InProgress -> Returned` (reversible via cancel). A bar that
/// has been closed can no longer be returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BarState {
    InProgress,
    AwaitingPayment(Settlement),
    Settled(Settlement),
    Returned { return_date: DateTime<Utc> },
}

/// Pricing and invoice details fixed when a bar (or forward commitment)
/// is closed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settlement {
    /// Spot gold price, EUR per troy ounce
    pub spot_price_per_ounce: Decimal,
    /// Gram price derived from the spot price, rounded up to the cent
    pub base_price_per_gram: Decimal,
    /// Negotiated gram price base for this client (operator-entered)
    pub client_base_price_per_gram: Decimal,
    /// Broker/wholesale cost basis used for the total margin
    pub reference_cost_price_per_gram: Decimal,
    pub margin_percent: Decimal,
    pub client_price_per_gram: Decimal,
    pub invoice_amount: Decimal,
    pub invoice_ref: Option<String>,
    pub close_date: NaiveDate,
    /// Partial-return gram credit deducted from the billed weight
    pub returned_weight_grams: Decimal,
    /// Profit over the spot-derived base price
    pub closing_margin: Decimal,
    /// Profit over the reference cost
    pub total_margin: Decimal,
}

/// Illegal bar state transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("only an in-progress bar can be closed (current state: {0})")]
    CloseRequiresInProgress(&'static str),
    #[error("only a closed bar can change payment state (current state: {0})")]
    PaymentRequiresClosed(&'static str),
    #[error("only an in-progress bar can be returned (current state: {0})")]
    ReturnRequiresInProgress(&'static str),
    #[error("only a returned bar can have its return cancelled (current state: {0})")]
    CancelRequiresReturned(&'static str),
}

/// One physical gold bar inside a delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    /// Weight class in grams; never changes after creation
    pub weight_grams: Decimal,
    pub state: BarState,
    /// True when this bar materialized a forward-sold commitment
    pub from_forward_commitment: bool,
}

impl Bar {
    /// A fresh in-progress bar of the given weight class
    pub fn new(weight_grams: Decimal) -> Self {
        Self {
            weight_grams,
            state: BarState::InProgress,
            from_forward_commitment: false,
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self.state {
            BarState::InProgress => "in_progress",
            BarState::AwaitingPayment(_) => "awaiting_payment",
            BarState::Settled(_) => "settled",
            BarState::Returned { .. } => "returned",
        }
    }

    /// Whether this bar still consumes batch stock (everything but Returned)
    pub fn consumes_stock(&self) -> bool {
        !matches!(self.state, BarState::Returned { .. })
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.state, BarState::InProgress)
    }

    /// Settlement record, if the bar has been closed
    pub fn settlement(&self) -> Option<&Settlement> {
        match &self.state {
            BarState::AwaitingPayment(s) | BarState::Settled(s) => Some(s),
            _ => None,
        }
    }

    /// Fix price and invoice details; moves the bar to awaiting payment
    pub fn close(&mut self, settlement: Settlement) -> Result<(), TransitionError> {
        if !self.is_in_progress() {
            return Err(TransitionError::CloseRequiresInProgress(self.state_name()));
        }
        self.state = BarState::AwaitingPayment(settlement);
        Ok(())
    }

    /// Idempotent in effect: marking an already settled bar paid is a no-op
    pub fn mark_paid(&mut self) -> Result<(), TransitionError> {
        match &self.state {
            BarState::AwaitingPayment(s) => {
                self.state = BarState::Settled(s.clone());
                Ok(())
            }
            BarState::Settled(_) => Ok(()),
            _ => Err(TransitionError::PaymentRequiresClosed(self.state_name())),
        }
    }

    /// Idempotent in effect: unmarking a bar already awaiting payment is a
    /// no-op
    pub fn unmark_paid(&mut self) -> Result<(), TransitionError> {
        match &self.state {
            BarState::Settled(s) => {
                self.state = BarState::AwaitingPayment(s.clone());
                Ok(())
            }
            BarState::AwaitingPayment(_) => Ok(()),
            _ => Err(TransitionError::PaymentRequiresClosed(self.state_name())),
        }
    }

    /// Take the bar back on consignment; releases its batch stock
    pub fn record_return(&mut self, return_date: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.is_in_progress() {
            return Err(TransitionError::ReturnRequiresInProgress(self.state_name()));
        }
        self.state = BarState::Returned { return_date };
        Ok(())
    }

    pub fn cancel_return(&mut self) -> Result<(), TransitionError> {
        if !matches!(self.state, BarState::Returned { .. }) {
            return Err(TransitionError::CancelRequiresReturned(self.state_name()));
        }
        self.state = BarState::InProgress;
        Ok(())
    }
}
