//! Slippage model.
//!
//! Buys pay more than the quote and sells receive less, by a fixed number of
//! basis points capped at an absolute per-share amount.

use rust_decimal::Decimal;

use crate::domain::order_lifecycle::OrderSide;
use crate::domain::shared::Money;

use super::config::SlippageConfig;

/// Basis points divisor (10000).
const BPS_DIVISOR: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);

/// Per-share slippage amount for a quote price. Never negative.
#[must_use]
pub fn slippage_amount(config: &SlippageConfig, price: Money) -> Decimal {
    let proportional = price.amount() * config.basis_points / BPS_DIVISOR;
    proportional.min(config.max_slippage).max(Decimal::ZERO)
}

/// Price a market fill by moving the quote against the taker.
#[must_use]
pub fn apply_slippage(config: &SlippageConfig, price: Money, side: OrderSide) -> Money {
    let slippage = slippage_amount(config, price);
    match side {
        OrderSide::Buy => Money::new(price.amount() + slippage),
        OrderSide::Sell => Money::new(price.amount() - slippage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn buy_pays_five_bps() {
        let fill = apply_slippage(&SlippageConfig::default(), Money::new(dec!(150)), OrderSide::Buy);
        assert_eq!(fill.amount(), dec!(150.075));
    }

    #[test]
    fn sell_receives_less() {
        let fill = apply_slippage(&SlippageConfig::default(), Money::new(dec!(150)), OrderSide::Sell);
        assert_eq!(fill.amount(), dec!(149.925));
    }

    #[test]
    fn expensive_stock_hits_cap() {
        let fill = apply_slippage(&SlippageConfig::default(), Money::new(dec!(5000)), OrderSide::Buy);
        assert_eq!(fill.amount(), dec!(5000.50));
    }

    proptest! {
        #[test]
        fn slippage_never_exceeds_cap(cents in 1i64..100_000_000) {
            let config = SlippageConfig::default();
            let price = Money::from_cents(cents);
            let buy = apply_slippage(&config, price, OrderSide::Buy);
            let sell = apply_slippage(&config, price, OrderSide::Sell);
            prop_assert!(buy.amount() >= price.amount());
            prop_assert!(sell.amount() <= price.amount());
            prop_assert!(buy.amount() - price.amount() <= config.max_slippage);
            prop_assert!(price.amount() - sell.amount() <= config.max_slippage);
        }
    }
}
