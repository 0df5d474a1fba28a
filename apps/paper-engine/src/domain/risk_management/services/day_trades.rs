//! Round-trip detection for pattern day trader rules.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::risk_management::value_objects::ExecutionRecord;
use crate::domain::shared::Symbol;

/// Count day trades executed on dates in `[from, to]`.
///
/// Fills are grouped by trading date and symbol. Within a group the running
/// signed position starts flat and each pass through zero (long to flat or
/// short, short to flat or long) is one round trip. Fills are walked in
/// execution-time order regardless of the input order.
#[must_use]
pub fn count_day_trades(executions: &[ExecutionRecord], from: NaiveDate, to: NaiveDate) -> u32 {
    let mut groups: BTreeMap<(NaiveDate, &Symbol), Vec<&ExecutionRecord>> = BTreeMap::new();
    for execution in executions {
        let date = execution.executed_at.date();
        if date < from || date > to {
            continue;
        }
        groups
            .entry((date, &execution.symbol))
            .or_default()
            .push(execution);
    }

    groups
        .into_values()
        .map(|mut fills| {
            fills.sort_by_key(|e| e.executed_at);
            round_trips(&fills)
        })
        .sum()
}

/// Count day trades in the rolling window ending on `as_of`.
#[must_use]
pub fn count_day_trades_in_window(
    executions: &[ExecutionRecord],
    as_of: NaiveDate,
    window_days: u32,
) -> u32 {
    let span = u64::from(window_days.saturating_sub(1));
    let from = as_of.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
    count_day_trades(executions, from, as_of)
}

fn round_trips(fills: &[&ExecutionRecord]) -> u32 {
    let mut position = Decimal::ZERO;
    let mut trips = 0;
    for fill in fills {
        let previous = position;
        position += fill.signed_quantity();
        let closed_long = previous > Decimal::ZERO && position <= Decimal::ZERO;
        let closed_short = previous < Decimal::ZERO && position >= Decimal::ZERO;
        if closed_long || closed_short {
            trips += 1;
        }
    }
    trips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::OrderSide;
    use crate::domain::shared::{Quantity, Timestamp};

    fn fill(symbol: &str, side: OrderSide, qty: i64, at: &str) -> ExecutionRecord {
        ExecutionRecord {
            symbol: Symbol::new(symbol),
            side,
            quantity: Quantity::from_i64(qty),
            executed_at: Timestamp::parse(at).unwrap(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn buy_then_sell_is_one_round_trip() {
        let fills = vec![
            fill("AAPL", OrderSide::Buy, 100, "2024-03-04T15:00:00Z"),
            fill("AAPL", OrderSide::Sell, 100, "2024-03-04T16:00:00Z"),
        ];
        assert_eq!(count_day_trades(&fills, day("2024-03-04"), day("2024-03-04")), 1);
    }

    #[test]
    fn execution_order_not_input_order_decides() {
        // Sorted: buy 100, sell 50, sell 50 -> one flip at the last fill.
        let fills = vec![
            fill("AAPL", OrderSide::Sell, 50, "2024-03-04T17:00:00Z"),
            fill("AAPL", OrderSide::Buy, 100, "2024-03-04T15:00:00Z"),
            fill("AAPL", OrderSide::Sell, 50, "2024-03-04T16:00:00Z"),
        ];
        assert_eq!(count_day_trades(&fills, day("2024-03-04"), day("2024-03-04")), 1);
    }

    #[test]
    fn flip_through_zero_counts_each_crossing() {
        let fills = vec![
            fill("TSLA", OrderSide::Sell, 10, "2024-03-04T14:00:00Z"),
            fill("TSLA", OrderSide::Buy, 20, "2024-03-04T15:00:00Z"),
            fill("TSLA", OrderSide::Sell, 10, "2024-03-04T16:00:00Z"),
        ];
        assert_eq!(count_day_trades(&fills, day("2024-03-04"), day("2024-03-04")), 2);
    }

    #[test]
    fn overnight_and_cross_symbol_fills_do_not_pair() {
        let fills = vec![
            fill("AAPL", OrderSide::Buy, 100, "2024-03-04T15:00:00Z"),
            fill("AAPL", OrderSide::Sell, 100, "2024-03-05T15:00:00Z"),
            fill("MSFT", OrderSide::Sell, 100, "2024-03-04T16:00:00Z"),
        ];
        assert_eq!(count_day_trades(&fills, day("2024-03-01"), day("2024-03-08")), 0);
    }

    #[test]
    fn window_excludes_older_trades() {
        let fills = vec![
            fill("AAPL", OrderSide::Buy, 1, "2024-03-01T15:00:00Z"),
            fill("AAPL", OrderSide::Sell, 1, "2024-03-01T16:00:00Z"),
            fill("AAPL", OrderSide::Buy, 1, "2024-03-07T15:00:00Z"),
            fill("AAPL", OrderSide::Sell, 1, "2024-03-07T16:00:00Z"),
        ];
        assert_eq!(count_day_trades_in_window(&fills, day("2024-03-07"), 5), 1);
        assert_eq!(count_day_trades_in_window(&fills, day("2024-03-07"), 7), 2);
    }
}
