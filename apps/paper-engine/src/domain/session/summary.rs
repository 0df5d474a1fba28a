//! Per-portfolio daily order summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::{Order, OrderStatus};
use crate::domain::shared::{Money, PortfolioId, Quantity, Timestamp};

const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Order activity of one portfolio on one trading date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyOrderSummary {
    /// Trading date.
    pub date: NaiveDate,
    /// Portfolio.
    pub portfolio_id: PortfolioId,
    /// Orders created or updated on the date.
    pub total_orders: usize,
    /// Of those, fully executed.
    pub executed_orders: usize,
    /// Of those, cancelled.
    pub cancelled_orders: usize,
    /// Of those, expired.
    pub expired_orders: usize,
    /// Shares executed by fills on the date.
    pub total_volume: Quantity,
    /// Notional of fills on the date.
    pub total_value: Money,
    /// Commission paid on fills on the date.
    pub commissions: Money,
    /// Portfolio profit or loss for the day.
    pub pnl: Money,
    /// `executed / total * 100`, zero without orders.
    pub success_rate: Decimal,
}

impl DailyOrderSummary {
    /// Summarize `orders`, which the caller has already restricted to the date.
    ///
    /// Volume, value and commission only count fills timestamped inside
    /// `[start, end)`; a GTC order filled across several days contributes
    /// each fill to its own day.
    #[must_use]
    pub fn from_orders(
        date: NaiveDate,
        portfolio_id: PortfolioId,
        orders: &[Order],
        (start, end): (Timestamp, Timestamp),
        pnl: Money,
    ) -> Self {
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status() == status).count();
        let executed_orders = count(OrderStatus::Executed);

        let (total_volume, total_value, commissions) = orders
            .iter()
            .flat_map(Order::execution_reports)
            .filter(|report| report.timestamp >= start && report.timestamp < end)
            .fold(
                (Quantity::ZERO, Money::ZERO, Money::ZERO),
                |(volume, value, commission), report| {
                    (
                        volume + report.quantity,
                        value + report.notional(),
                        commission + report.commission,
                    )
                },
            );

        Self {
            date,
            portfolio_id,
            total_orders: orders.len(),
            executed_orders,
            cancelled_orders: count(OrderStatus::Cancelled),
            expired_orders: count(OrderStatus::Expired),
            total_volume,
            total_value: total_value.round_to_cent(),
            commissions,
            pnl,
            success_rate: success_rate(executed_orders, orders.len()),
        }
    }
}

fn success_rate(executed: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(executed) * HUNDRED / Decimal::from(total)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::{
        CancelReason, CreateOrderCommand, ExecutionReport, OrderSide, OrderType,
    };
    use crate::domain::shared::Symbol;
    use rust_decimal_macros::dec;

    fn march_4() -> (Timestamp, Timestamp) {
        (
            Timestamp::parse("2024-03-04T05:00:00Z").unwrap(),
            Timestamp::parse("2024-03-05T05:00:00Z").unwrap(),
        )
    }

    fn fill(qty: i64, price: Decimal, commission: Decimal, at: &str) -> ExecutionReport {
        let mut report =
            ExecutionReport::paper(Quantity::from_i64(qty), Money::new(price), Money::new(commission));
        report.timestamp = Timestamp::parse(at).unwrap();
        report
    }

    fn order() -> Order {
        Order::new(CreateOrderCommand::new(
            PortfolioId::new("pf-1"),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from_i64(10),
        ))
        .unwrap()
    }

    #[test]
    fn empty_day_has_zero_success_rate() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let summary = DailyOrderSummary::from_orders(
            date,
            PortfolioId::new("pf-1"),
            &[],
            march_4(),
            Money::ZERO,
        );
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.success_rate, Decimal::ZERO);
    }

    #[test]
    fn counts_by_status() {
        let mut cancelled = order();
        cancelled.cancel(CancelReason::user_requested()).unwrap();
        let mut expired = order();
        expired.expire().unwrap();
        let orders = vec![order(), cancelled, expired];

        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let summary = DailyOrderSummary::from_orders(
            date,
            PortfolioId::new("pf-1"),
            &orders,
            march_4(),
            Money::from_cents(-1250),
        );
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.cancelled_orders, 1);
        assert_eq!(summary.expired_orders, 1);
        assert_eq!(summary.executed_orders, 0);
        assert_eq!(summary.pnl, Money::from_cents(-1250));
    }

    #[test]
    fn fills_from_earlier_days_are_excluded() {
        let mut gtc = order();
        gtc.apply_fill(fill(4, dec!(100), dec!(1.00), "2024-03-01T15:00:00Z"))
            .unwrap();
        gtc.apply_fill(fill(6, dec!(110), dec!(1.25), "2024-03-04T15:00:00Z"))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let summary = DailyOrderSummary::from_orders(
            date,
            PortfolioId::new("pf-1"),
            &[gtc],
            march_4(),
            Money::ZERO,
        );

        assert_eq!(summary.executed_orders, 1);
        assert_eq!(summary.total_volume, Quantity::from_i64(6));
        assert_eq!(summary.total_value, Money::new(dec!(660)));
        assert_eq!(summary.commissions, Money::new(dec!(1.25)));
    }

    #[test]
    fn success_rate_rounds_to_two_places() {
        assert_eq!(success_rate(1, 3), Decimal::new(3333, 2));
        assert_eq!(success_rate(2, 2), HUNDRED);
    }
}
