//! Validation utilities for the Gold Bar Inventory Platform

use rust_decimal::Decimal;

use crate::models::CompositionLine;
use crate::types::RequestedItem;

// ============================================================================
// Composition Validations
// ============================================================================

/// Validate a batch composition: positive weights and counts, no duplicate
/// weight class
pub fn validate_composition(lines: &[CompositionLine]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("Composition must contain at least one weight class");
    }
    for line in lines {
        if line.weight_grams <= Decimal::ZERO {
            return Err("Weight class must be positive");
        }
        if line.count == 0 {
            return Err("Weight class count must be positive");
        }
    }
    for (i, line) in lines.iter().enumerate() {
        if lines[i + 1..].iter().any(|l| l.weight_grams == line.weight_grams) {
            return Err("Duplicate weight class in composition");
        }
    }
    Ok(())
}

/// Validate the requested lines of a delivery
pub fn validate_requested_items(items: &[RequestedItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("Delivery must request at least one bar");
    }
    for item in items {
        if item.weight_grams <= Decimal::ZERO {
            return Err("Requested weight class must be positive");
        }
        if item.count == 0 {
            return Err("Requested count must be positive");
        }
    }
    for (i, item) in items.iter().enumerate() {
        if items[i + 1..].iter().any(|o| o.weight_grams == item.weight_grams) {
            return Err("Duplicate weight class in request");
        }
    }
    Ok(())
}

// ============================================================================
// Settlement Validations
// ============================================================================

/// Validate a spot price entered at close time
pub fn validate_spot_price(spot_price_per_ounce: Decimal) -> Result<(), &'static str> {
    if spot_price_per_ounce <= Decimal::ZERO {
        return Err("Spot price must be positive");
    }
    Ok(())
}

/// Validate a gram price entered at close time
pub fn validate_gram_price(price_per_gram: Decimal) -> Result<(), &'static str> {
    if price_per_gram <= Decimal::ZERO {
        return Err("Gram price must be positive");
    }
    Ok(())
}

/// Validate a margin percentage (negative margins are allowed for
/// below-reference sales, but bounded to a sane range)
pub fn validate_margin_percent(margin_percent: Decimal) -> Result<(), &'static str> {
    if margin_percent < Decimal::from(-100) || margin_percent > Decimal::from(100) {
        return Err("Margin percent must be between -100 and 100");
    }
    Ok(())
}

/// Validate the uniform gram deduction applied at close time
pub fn validate_devolution_grams(devolution_grams: Decimal) -> Result<(), &'static str> {
    if devolution_grams < Decimal::ZERO {
        return Err("Devolution grams cannot be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(weight: i64, count: u32) -> CompositionLine {
        CompositionLine {
            weight_grams: Decimal::from(weight),
            count,
        }
    }

    #[test]
    fn composition_rejects_duplicate_weight_class() {
        let lines = vec![line(50, 10), line(100, 5), line(50, 2)];
        assert!(validate_composition(&lines).is_err());
    }

    #[test]
    fn composition_accepts_distinct_weight_classes() {
        let lines = vec![line(50, 10), line(100, 5), line(250, 1)];
        assert!(validate_composition(&lines).is_ok());
    }

    #[test]
    fn requested_items_reject_zero_count() {
        let items = vec![RequestedItem {
            weight_grams: Decimal::from(50),
            count: 0,
        }];
        assert!(validate_requested_items(&items).is_err());
    }

    #[test]
    fn devolution_rejects_negative() {
        assert!(validate_devolution_grams(Decimal::from(-1)).is_err());
        assert!(validate_devolution_grams(Decimal::ZERO).is_ok());
    }

    proptest! {
        /// Margin acceptance matches the closed [-100, 100] interval exactly
        #[test]
        fn margin_bounds_are_inclusive(hundredths in -20_000i64..20_000) {
            let margin = Decimal::new(hundredths, 2);
            let in_range = margin >= Decimal::from(-100) && margin <= Decimal::from(100);
            prop_assert_eq!(validate_margin_percent(margin).is_ok(), in_range);
        }

        /// Any composition with a repeated weight class is rejected
        #[test]
        fn duplicate_weight_class_always_rejected(weight in 1i64..1000, count in 1u32..50) {
            let lines = vec![line(weight, count), line(weight, count)];
            prop_assert!(validate_composition(&lines).is_err());
        }
    }
}
