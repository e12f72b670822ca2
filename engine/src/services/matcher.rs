//! FIFO matcher: converts pending forward commitments into delivered bars
//!
//! Pure planning step of delivery creation. Within a weight class the
//! oldest commitment wins; there is no secondary ordering key and a single
//! commitment is never split across bars.

use shared::{Bar, BarState, ForwardCommitment, RequestedItem};

/// Result of matching a delivery request against a client's pending
/// commitments
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Bars for the new delivery, in request order: forward-converted bars
    /// first, then fresh ones, per weight class
    pub bars: Vec<Bar>,
    /// Commitments consumed by this delivery; the orchestrator deletes them
    /// once the delivery is persisted
    pub consumed: Vec<ForwardCommitment>,
}

impl MatchOutcome {
    pub fn forward_converted_count(&self) -> usize {
        self.consumed.len()
    }
}

/// Materialize a consumed commitment as a bar
///
/// A priced commitment carries its settlement snapshot verbatim and starts
/// in awaiting-payment (or settled if it was already paid); a priceless one
/// becomes a plain in-progress bar.
fn bar_from_commitment(commitment: &ForwardCommitment) -> Bar {
    let state = match &commitment.settlement {
        Some(settlement) if commitment.paid => BarState::Settled(settlement.clone()),
        Some(settlement) => BarState::AwaitingPayment(settlement.clone()),
        None => BarState::InProgress,
    };
    Bar {
        weight_grams: commitment.weight_grams,
        state,
        from_forward_commitment: true,
    }
}

/// Match requested items against pending commitments, oldest first per
/// weight class
///
/// `pending` must be the client's own commitments; they are re-sorted by
/// `created_at` here so callers need not rely on store ordering.
pub fn match_forward_commitments(
    items: &[RequestedItem],
    pending: &[ForwardCommitment],
) -> MatchOutcome {
    let mut queue: Vec<&ForwardCommitment> = pending.iter().collect();
    queue.sort_by_key(|c| c.created_at);

    let mut bars = Vec::new();
    let mut consumed = Vec::new();

    for item in items {
        let mut remaining = item.count;
        let mut kept = Vec::with_capacity(queue.len());
        for commitment in queue {
            if remaining > 0 && commitment.weight_grams == item.weight_grams {
                bars.push(bar_from_commitment(commitment));
                consumed.push(commitment.clone());
                remaining -= 1;
            } else {
                kept.push(commitment);
            }
        }
        queue = kept;

        for _ in 0..remaining {
            bars.push(Bar::new(item.weight_grams));
        }
    }

    MatchOutcome { bars, consumed }
}
