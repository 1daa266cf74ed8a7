//! Condition predicates gating whether an action applies to an event.

use serde::{Deserialize, Serialize};
use tracing::warn;

use streamrig_core::{Event, EventType};

use crate::expr;

/// One predicate over an incoming event.
///
/// The event type must match the filter; beyond that, either an
/// `expression` over the event magnitude decides (truthy result matches),
/// or a literal `threshold` requires the exact amount. With neither set,
/// the type filter alone decides.
///
/// Only literal thresholds participate in the handler's fuzzy fallback;
/// expressions are deliberately excluded from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Condition {
    /// Condition matching a bare event type.
    pub fn for_type(event_type: EventType) -> Self {
        Self {
            event_type,
            threshold: None,
            expression: None,
        }
    }

    /// Condition matching an exact amount.
    pub fn with_threshold(event_type: EventType, threshold: i64) -> Self {
        Self {
            event_type,
            threshold: Some(threshold),
            expression: None,
        }
    }

    /// Condition matching when the expression over `event` is truthy.
    pub fn with_expression(event_type: EventType, expression: &str) -> Self {
        Self {
            event_type,
            threshold: None,
            expression: Some(expression.to_string()),
        }
    }

    /// Test this condition against an event. Expression errors are logged
    /// and count as no match; they never propagate.
    pub fn matches(&self, event: &Event) -> bool {
        if event.event_type != self.event_type {
            return false;
        }
        if let Some(expression) = &self.expression {
            return match expr::evaluate(expression, event.amount as f64) {
                Ok(value) => expr::is_truthy(value),
                Err(e) => {
                    warn!(expression, error = %e, "condition expression error");
                    false
                }
            };
        }
        if let Some(threshold) = self.threshold {
            return event.amount == threshold;
        }
        true
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use streamrig_core::NO_AMOUNT;

    #[test]
    fn type_filter_must_match() {
        let condition = Condition::with_threshold(EventType::Donation, 20);
        assert!(!condition.matches(&Event::new(EventType::TwitchBits, 20)));
    }

    #[test]
    fn bare_type_condition_matches_any_amount() {
        let condition = Condition::for_type(EventType::TwitchFollow);
        assert!(condition.matches(&Event::without_amount(EventType::TwitchFollow)));
        assert!(condition.matches(&Event::new(EventType::TwitchFollow, 7)));
    }

    #[test]
    fn threshold_is_exact() {
        let condition = Condition::with_threshold(EventType::Donation, 20);
        assert!(condition.matches(&Event::new(EventType::Donation, 20)));
        assert!(!condition.matches(&Event::new(EventType::Donation, 25)));
        assert!(!condition.matches(&Event::new(EventType::Donation, 19)));
    }

    #[test]
    fn expression_tracks_amount() {
        let condition = Condition::with_expression(EventType::Donation, "event >= 20");
        for amount in [-1, 0, 19, 20, 21, 100] {
            assert_eq!(
                condition.matches(&Event::new(EventType::Donation, amount)),
                amount >= 20
            );
        }
    }

    #[test]
    fn no_amount_sentinel_flows_through() {
        let condition = Condition::with_expression(EventType::TwitchFollow, "event >= 0");
        assert!(!condition.matches(&Event::without_amount(EventType::TwitchFollow)));
        assert_eq!(
            Event::without_amount(EventType::TwitchFollow).amount,
            NO_AMOUNT
        );
    }

    #[test]
    fn malformed_expression_never_matches() {
        let condition = Condition::with_expression(EventType::Donation, "event >=");
        assert!(!condition.matches(&Event::new(EventType::Donation, 50)));
    }

    #[test]
    fn deserializes_from_rule_file_shape() {
        let condition: Condition = serde_json::from_str(
            r#"{"eventType": "donation", "threshold": 20}"#,
        )
        .unwrap();
        assert_eq!(condition, Condition::with_threshold(EventType::Donation, 20));

        let condition: Condition = serde_json::from_str(
            r#"{"eventType": "twitch_bits", "expression": "event >= 100"}"#,
        )
        .unwrap();
        assert_eq!(condition.event_type, EventType::TwitchBits);
        assert!(condition.threshold.is_none());
    }
}
