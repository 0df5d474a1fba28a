//! Commission model.

use crate::domain::shared::{Money, Quantity};

use super::config::CommissionConfig;

/// Commission charged on one fill.
///
/// Base fee plus per-share and percentage components, clamped to the
/// configured floor and cap, then rounded to the cent.
#[must_use]
pub fn calculate_commission(config: &CommissionConfig, quantity: Quantity, price: Money) -> Money {
    let trade_value = quantity.amount() * price.amount();
    let raw = config.base_fee
        + quantity.amount() * config.per_share_fee
        + trade_value * config.percentage_fee;

    let clamped = raw.max(config.minimum_fee).min(config.maximum_fee);
    Money::new(clamped).round_to_cent()
}
