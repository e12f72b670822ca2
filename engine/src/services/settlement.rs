//! Settlement calculator: pure pricing and margin derivation
//!
//! Used both when closing delivered bars and when closing a forward-sold
//! commitment directly. No I/O.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use shared::Settlement;

/// Grams per troy ounce (31.10349)
pub const GRAMS_PER_TROY_OUNCE: Decimal = Decimal::from_parts(3110349, 0, 0, false, 5);

/// Gram price derived from the spot ounce price, rounded **up** to the cent.
///
/// The rounding direction is deliberate: the derived base never understates
/// the metal cost.
pub fn base_price_per_gram(spot_price_per_ounce: Decimal) -> Decimal {
    (spot_price_per_ounce / GRAMS_PER_TROY_OUNCE)
        .round_dp_with_strategy(2, RoundingStrategy::AwayFromZero)
}

/// Client gram price: negotiated base plus margin, rounded to the nearest cent
pub fn client_price_per_gram(client_base_price_per_gram: Decimal, margin_percent: Decimal) -> Decimal {
    let factor = Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED;
    (client_base_price_per_gram * factor)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Operator inputs fixed once per close call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementInput {
    pub spot_price_per_ounce: Decimal,
    pub client_base_price_per_gram: Decimal,
    pub reference_cost_price_per_gram: Decimal,
    pub margin_percent: Decimal,
    pub invoice_ref: Option<String>,
    pub close_date: NaiveDate,
    /// Uniform gram deduction applied to every bar of the close call
    pub devolution_grams: Decimal,
}

/// Derive the full settlement record for one bar of the given weight class
pub fn settle(input: &SettlementInput, weight_grams: Decimal) -> Settlement {
    let net_weight = weight_grams - input.devolution_grams;
    let base = base_price_per_gram(input.spot_price_per_ounce);
    let client_price = client_price_per_gram(input.client_base_price_per_gram, input.margin_percent);

    let invoice_amount = (client_price * net_weight)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let reference_cost_amount = (input.reference_cost_price_per_gram * net_weight)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let closing_margin = ((input.client_base_price_per_gram - base) * net_weight)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total_margin = invoice_amount - reference_cost_amount;

    Settlement {
        spot_price_per_ounce: input.spot_price_per_ounce,
        base_price_per_gram: base,
        client_base_price_per_gram: input.client_base_price_per_gram,
        reference_cost_price_per_gram: input.reference_cost_price_per_gram,
        margin_percent: input.margin_percent,
        client_price_per_gram: client_price,
        invoice_amount,
        invoice_ref: input.invoice_ref.clone(),
        close_date: input.close_date,
        returned_weight_grams: input.devolution_grams,
        closing_margin,
        total_margin,
    }
}

/// Pre-fill suggestion for the operator-entered prices
///
/// Both values are starting points for negotiation and always overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub base_price_per_gram: Decimal,
    pub client_base_price_per_gram: Decimal,
    pub reference_cost_price_per_gram: Decimal,
}

/// Suggest prices from the spot ounce price and the configured reference
/// cost spread
pub fn suggest_prices(spot_price_per_ounce: Decimal, reference_cost_spread: Decimal) -> PriceSuggestion {
    let base = base_price_per_gram(spot_price_per_ounce);
    PriceSuggestion {
        base_price_per_gram: base,
        client_base_price_per_gram: base,
        reference_cost_price_per_gram: base + reference_cost_spread,
    }
}
