//! Trigger Evaluator
//!
//! Pure evaluation of AND/OR trigger groups against a quote snapshot.
//!
//! Triggers without an operator, or with `AND`, form the AND-group; triggers
//! with `OR` form the OR-group. The AND-group passes when every member passes
//! (vacuously true), the OR-group when any member passes (vacuously false).
//! With both groups populated both must pass; with one populated its result
//! stands; with none the result is `false`.
//!
//! Misconfigured triggers evaluate to `false` and are logged. Nothing here
//! returns an error.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::conditional_triggers::value_objects::{
    ConditionalTrigger, LogicalOperator, TriggerCondition, TriggerType, TriggerValue,
};
use crate::domain::market_data::Quote;
use crate::domain::order_lifecycle::{Activation, Order, OrderStatus};

/// Relative tolerance for numeric `equals` (0.1%).
const EQUALS_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Window for time `equals`, in seconds either side of the target.
const TIME_EQUALS_WINDOW_SECS: i64 = 60;

/// Stateless evaluator for conditional trigger trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerEvaluator;

impl TriggerEvaluator {
    /// Create a new evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate `triggers` against `snapshot` using the current wall clock.
    #[must_use]
    pub fn evaluate(&self, triggers: &[ConditionalTrigger], snapshot: &Quote) -> bool {
        self.evaluate_at(triggers, snapshot, Utc::now())
    }

    /// Evaluate `triggers` against `snapshot` with an explicit `now`.
    #[must_use]
    pub fn evaluate_at(
        &self,
        triggers: &[ConditionalTrigger],
        snapshot: &Quote,
        now: DateTime<Utc>,
    ) -> bool {
        let (and_group, or_group): (Vec<_>, Vec<_>) = triggers
            .iter()
            .partition(|t| t.operator() == LogicalOperator::And);

        let and_result = and_group
            .iter()
            .all(|t| self.evaluate_trigger(t, snapshot, now));
        let or_result = or_group
            .iter()
            .any(|t| self.evaluate_trigger(t, snapshot, now));

        match (and_group.is_empty(), or_group.is_empty()) {
            (true, true) => false,
            (false, true) => and_result,
            (true, false) => or_result,
            (false, false) => and_result && or_result,
        }
    }

    /// Evaluate a single trigger.
    #[must_use]
    pub fn evaluate_trigger(
        &self,
        trigger: &ConditionalTrigger,
        snapshot: &Quote,
        now: DateTime<Utc>,
    ) -> bool {
        if trigger.trigger_type.is_time() {
            return Self::evaluate_time(trigger, now);
        }

        let Some(actual) = Self::resolve_field(trigger, snapshot) else {
            tracing::warn!(
                field = %trigger.field,
                symbol = %snapshot.symbol,
                "Trigger field not available in snapshot"
            );
            return false;
        };

        let Some(target) = trigger.value.as_numeric() else {
            tracing::warn!(
                field = %trigger.field,
                "Numeric trigger configured with a timestamp value"
            );
            return false;
        };

        match trigger.condition {
            TriggerCondition::GreaterThan => actual > target,
            TriggerCondition::LessThan => actual < target,
            TriggerCondition::Equals => {
                (actual - target).abs() <= target.abs() * EQUALS_TOLERANCE
            }
            TriggerCondition::Between => {
                let Some(bound) = trigger.value2.as_ref().and_then(TriggerValue::as_numeric)
                else {
                    tracing::warn!(
                        field = %trigger.field,
                        "Between trigger is missing a numeric value2"
                    );
                    return false;
                };
                actual >= target.min(bound) && actual <= target.max(bound)
            }
        }
    }

    /// Mint an activation for a PENDING conditional order whose triggers pass.
    #[must_use]
    pub fn try_activate(
        &self,
        order: &Order,
        snapshot: &Quote,
        now: DateTime<Utc>,
    ) -> Option<Activation> {
        if order.status() != OrderStatus::Pending || !order.is_conditional() {
            return None;
        }
        if self.evaluate_at(order.triggers(), snapshot, now) {
            tracing::info!(
                order_id = %order.id(),
                symbol = %order.symbol(),
                "Conditional triggers satisfied"
            );
            Some(Activation::conditional())
        } else {
            None
        }
    }

    fn evaluate_time(trigger: &ConditionalTrigger, now: DateTime<Utc>) -> bool {
        let Some(target) = trigger.value.as_timestamp() else {
            tracing::warn!("Time trigger configured with a numeric value");
            return false;
        };

        match trigger.condition {
            TriggerCondition::GreaterThan => now > target,
            TriggerCondition::LessThan => now < target,
            TriggerCondition::Equals => {
                (now - target).abs() <= Duration::seconds(TIME_EQUALS_WINDOW_SECS)
            }
            TriggerCondition::Between => {
                let Some(bound) = trigger.value2.as_ref().and_then(TriggerValue::as_timestamp)
                else {
                    tracing::warn!("Between time trigger is missing a timestamp value2");
                    return false;
                };
                now >= target.min(bound) && now <= target.max(bound)
            }
        }
    }

    fn resolve_field(trigger: &ConditionalTrigger, snapshot: &Quote) -> Option<Decimal> {
        let field = if trigger.field.is_empty() {
            match trigger.trigger_type {
                TriggerType::Price => "price",
                TriggerType::Volume => "volume",
                TriggerType::Indicator | TriggerType::Time => return None,
            }
        } else {
            trigger.field.as_str()
        };

        match field.to_ascii_lowercase().as_str() {
            "price" => Some(snapshot.price.amount()),
            "volume" => Some(Decimal::from(snapshot.volume)),
            "high" => snapshot.high.map(|m| m.amount()),
            "low" => snapshot.low.map(|m| m.amount()),
            "open" => snapshot.open.map(|m| m.amount()),
            "bid" => snapshot.bid.map(|m| m.amount()),
            "ask" => snapshot.ask.map(|m| m.amount()),
            lowered => snapshot
                .indicators
                .get(field)
                .or_else(|| snapshot.indicators.get(lowered))
                .copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::{CreateOrderCommand, OrderSide, OrderType};
    use crate::domain::shared::{Money, PortfolioId, Quantity, Symbol};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn snapshot(price: Decimal, volume: u64) -> Quote {
        Quote::new(Symbol::new("AAPL"), Money::new(price))
            .with_volume(volume)
            .with_session_range(Money::new(dec!(100)), Money::new(dec!(110)), Money::new(dec!(95)))
            .with_indicator("rsi_14", dec!(28))
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn price(condition: TriggerCondition, value: Decimal) -> ConditionalTrigger {
        ConditionalTrigger::price(condition, value)
    }

    #[test]
    fn empty_trigger_list_is_false() {
        assert!(!TriggerEvaluator::new().evaluate_at(&[], &snapshot(dec!(105), 0), now()));
    }

    #[test]
    fn single_and_trigger_equals_its_own_result() {
        let evaluator = TriggerEvaluator::new();
        let snap = snapshot(dec!(105), 0);
        for trigger in [
            price(TriggerCondition::GreaterThan, dec!(100)),
            price(TriggerCondition::GreaterThan, dec!(110)),
        ] {
            assert_eq!(
                evaluator.evaluate_at(std::slice::from_ref(&trigger), &snap, now()),
                evaluator.evaluate_trigger(&trigger, &snap, now())
            );
        }
    }

    #[test]
    fn and_plus_or_requires_both_groups() {
        let evaluator = TriggerEvaluator::new();
        let triggers = vec![
            price(TriggerCondition::GreaterThan, dec!(100)),
            ConditionalTrigger::volume(TriggerCondition::GreaterThan, dec!(1000000)).or(),
        ];
        assert!(!evaluator.evaluate_at(&triggers, &snapshot(dec!(105), 500_000), now()));
        assert!(evaluator.evaluate_at(&triggers, &snapshot(dec!(105), 1_500_000), now()));
    }

    #[test]
    fn or_group_alone_needs_one_member() {
        let evaluator = TriggerEvaluator::new();
        let triggers = vec![
            price(TriggerCondition::GreaterThan, dec!(200)).or(),
            price(TriggerCondition::LessThan, dec!(110)).or(),
        ];
        assert!(evaluator.evaluate_at(&triggers, &snapshot(dec!(105), 0), now()));
        assert!(!evaluator.evaluate_at(&triggers, &snapshot(dec!(150), 0), now()));
    }

    #[test]
    fn explicit_and_operator_joins_and_group() {
        let evaluator = TriggerEvaluator::new();
        let triggers = vec![
            price(TriggerCondition::GreaterThan, dec!(100)).and(),
            price(TriggerCondition::LessThan, dec!(104)),
        ];
        assert!(!evaluator.evaluate_at(&triggers, &snapshot(dec!(105), 0), now()));
    }

    #[test_case(TriggerCondition::GreaterThan, dec!(100), true ; "greater than")]
    #[test_case(TriggerCondition::LessThan, dec!(100), false ; "less than")]
    #[test_case(TriggerCondition::Equals, dec!(105.1), true ; "equals within tolerance")]
    #[test_case(TriggerCondition::Equals, dec!(105.2), false ; "equals outside tolerance")]
    fn numeric_conditions(condition: TriggerCondition, target: Decimal, expected: bool) {
        let trigger = price(condition, target);
        assert_eq!(
            TriggerEvaluator::new().evaluate_trigger(&trigger, &snapshot(dec!(105), 0), now()),
            expected
        );
    }

    #[test]
    fn between_orders_bounds_regardless_of_input_order() {
        let evaluator = TriggerEvaluator::new();
        let snap = snapshot(dec!(105), 0);
        let forward = price(TriggerCondition::Between, dec!(100)).with_value2(dec!(110));
        let reversed = price(TriggerCondition::Between, dec!(110)).with_value2(dec!(100));
        assert!(evaluator.evaluate_trigger(&forward, &snap, now()));
        assert!(evaluator.evaluate_trigger(&reversed, &snap, now()));
        let outside = price(TriggerCondition::Between, dec!(106)).with_value2(dec!(120));
        assert!(!evaluator.evaluate_trigger(&outside, &snap, now()));
    }

    #[test]
    fn between_without_value2_is_false() {
        let trigger = price(TriggerCondition::Between, dec!(100));
        assert!(!TriggerEvaluator::new().evaluate_trigger(&trigger, &snapshot(dec!(105), 0), now()));
    }

    #[test]
    fn session_fields_and_indicators_resolve() {
        let evaluator = TriggerEvaluator::new();
        let snap = snapshot(dec!(105), 0);
        let high = ConditionalTrigger::numeric(
            TriggerType::Price,
            "high",
            TriggerCondition::GreaterThan,
            dec!(109),
        );
        let rsi = ConditionalTrigger::numeric(
            TriggerType::Indicator,
            "RSI_14",
            TriggerCondition::LessThan,
            dec!(30),
        );
        assert!(evaluator.evaluate_trigger(&high, &snap, now()));
        assert!(evaluator.evaluate_trigger(&rsi, &snap, now()));
    }

    #[test]
    fn bid_and_ask_resolve_when_quoted() {
        let evaluator = TriggerEvaluator::new();
        let ask = ConditionalTrigger::numeric(
            TriggerType::Price,
            "ask",
            TriggerCondition::LessThan,
            dec!(105.10),
        );
        let quoted = snapshot(dec!(105), 0)
            .with_bid_ask(Money::new(dec!(104.98)), Money::new(dec!(105.02)));

        assert!(evaluator.evaluate_trigger(&ask, &quoted, now()));
        assert!(!evaluator.evaluate_trigger(&ask, &snapshot(dec!(105), 0), now()));
    }

    #[test]
    fn unknown_field_is_false() {
        let trigger = ConditionalTrigger::numeric(
            TriggerType::Indicator,
            "macd_signal",
            TriggerCondition::GreaterThan,
            dec!(0),
        );
        assert!(!TriggerEvaluator::new().evaluate_trigger(&trigger, &snapshot(dec!(105), 0), now()));
    }

    #[test]
    fn missing_session_field_is_false() {
        let trigger = ConditionalTrigger::numeric(
            TriggerType::Price,
            "open",
            TriggerCondition::GreaterThan,
            dec!(0),
        );
        let bare = Quote::new(Symbol::new("AAPL"), Money::new(dec!(105)));
        assert!(!TriggerEvaluator::new().evaluate_trigger(&trigger, &bare, now()));
    }

    #[test]
    fn time_conditions() {
        let evaluator = TriggerEvaluator::new();
        let snap = snapshot(dec!(105), 0);
        let earlier = now() - Duration::minutes(5);
        let later = now() + Duration::minutes(5);

        let after = ConditionalTrigger::time(TriggerCondition::GreaterThan, earlier);
        let before = ConditionalTrigger::time(TriggerCondition::LessThan, earlier);
        let near = ConditionalTrigger::time(TriggerCondition::Equals, now() + Duration::seconds(45));
        let far = ConditionalTrigger::time(TriggerCondition::Equals, later);
        let window = ConditionalTrigger::time(TriggerCondition::Between, later).with_value2(earlier);

        assert!(evaluator.evaluate_trigger(&after, &snap, now()));
        assert!(!evaluator.evaluate_trigger(&before, &snap, now()));
        assert!(evaluator.evaluate_trigger(&near, &snap, now()));
        assert!(!evaluator.evaluate_trigger(&far, &snap, now()));
        assert!(evaluator.evaluate_trigger(&window, &snap, now()));
    }

    #[test]
    fn type_value_mismatch_is_false() {
        let evaluator = TriggerEvaluator::new();
        let snap = snapshot(dec!(105), 0);
        let mut time_with_number = ConditionalTrigger::time(TriggerCondition::GreaterThan, now());
        time_with_number.value = TriggerValue::Numeric(dec!(1));
        let mut price_with_time = price(TriggerCondition::GreaterThan, dec!(1));
        price_with_time.value = TriggerValue::Timestamp(now());

        assert!(!evaluator.evaluate_trigger(&time_with_number, &snap, now()));
        assert!(!evaluator.evaluate_trigger(&price_with_time, &snap, now()));
    }

    #[test]
    fn try_activate_only_for_pending_conditional_orders() {
        let evaluator = TriggerEvaluator::new();
        let base = CreateOrderCommand::new(
            PortfolioId::new("pf-1"),
            Symbol::new("AAPL"),
            OrderSide::Buy,
            OrderType::Market,
            Quantity::from_i64(10),
        );
        let plain = Order::new(base.clone()).unwrap();
        assert!(evaluator.try_activate(&plain, &snapshot(dec!(105), 0), now()).is_none());

        let mut conditional = Order::new(
            base.with_triggers(vec![price(TriggerCondition::GreaterThan, dec!(100))]),
        )
        .unwrap();
        assert!(evaluator.try_activate(&conditional, &snapshot(dec!(99), 0), now()).is_none());

        let activation = evaluator
            .try_activate(&conditional, &snapshot(dec!(105), 0), now())
            .unwrap();
        conditional.activate(activation).unwrap();
        assert_eq!(conditional.status(), OrderStatus::Triggered);
        assert!(evaluator.try_activate(&conditional, &snapshot(dec!(105), 0), now()).is_none());
    }
}
