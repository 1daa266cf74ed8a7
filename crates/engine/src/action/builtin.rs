//! Fixed-effect action variants.
//!
//! Each deserializes straight from its rule-file payload. Numeric
//! parameters may be expression strings over `event`; evaluation errors
//! fall back to the parameter's declared default.

use serde::{Deserialize, Serialize};

use streamrig_core::{Effect, Event, ExecParams, Execution};

use crate::condition::Condition;
use crate::expr;

use super::Action;

fn default_true() -> bool {
    true
}

fn default_half() -> f64 {
    0.5
}

fn default_radius() -> f64 {
    100.0
}

/// Spawns a meteor shower; `amount` is an expression over the event
/// magnitude (default 1 meteor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteorShowerAction {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl Action for MeteorShowerAction {
    fn message(&self) -> &str {
        &self.message
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn execute(&self, event: &Event, _params: &ExecParams) -> Execution {
        let count = expr::eval_or_default(self.amount.as_deref(), 1.0, event.amount as f64);
        Execution::of(
            &self.message,
            Effect::MeteorShower {
                radius: self.radius,
                count: count.max(0.0).round() as u32,
            },
        )
    }
}

/// Damages a percentage of the player's (and optionally vehicle's) blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapAction {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_true")]
    pub vehicle: bool,
    #[serde(default = "default_half")]
    pub vehicle_percentage: f64,
    #[serde(default = "default_half")]
    pub player_percentage: f64,
}

impl Action for SnapAction {
    fn message(&self) -> &str {
        &self.message
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn execute(&self, _event: &Event, _params: &ExecParams) -> Execution {
        Execution::of(
            &self.message,
            Effect::SnapDamage {
                vehicle: self.vehicle,
                vehicle_percentage: self.vehicle_percentage,
                player_percentage: self.player_percentage,
            },
        )
    }
}

/// Forces inertia dampeners on for the target's controlled entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnableDampenersAction {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Action for EnableDampenersAction {
    fn message(&self) -> &str {
        &self.message
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn execute(&self, _event: &Event, _params: &ExecParams) -> Execution {
        Execution::of(&self.message, Effect::EnableDampeners)
    }
}

/// Toggles the reactors of the ship the target is controlling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TogglePowerAction {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Action for TogglePowerAction {
    fn message(&self) -> &str {
        &self.message
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn execute(&self, _event: &Event, _params: &ExecParams) -> Execution {
        Execution::of(&self.message, Effect::TogglePower)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use streamrig_core::EventType;

    #[test]
    fn meteor_defaults() {
        let action: MeteorShowerAction = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(action.radius, 100.0);
        assert!(action.amount.is_none());
        assert!(action.conditions.is_empty());

        let execution = action.execute(&Event::new(EventType::Donation, 50), &ExecParams::new());
        assert_eq!(
            execution.effect,
            Some(Effect::MeteorShower {
                radius: 100.0,
                count: 1
            })
        );
    }

    #[test]
    fn meteor_amount_expression_scales_with_event() {
        let action: MeteorShowerAction = serde_json::from_str(
            r#"{"message": "Meteors!", "radius": 50.0, "amount": "event / 2"}"#,
        )
        .unwrap();
        let execution = action.execute(&Event::new(EventType::Donation, 20), &ExecParams::new());
        assert_eq!(
            execution.effect,
            Some(Effect::MeteorShower {
                radius: 50.0,
                count: 10
            })
        );
        assert_eq!(execution.message.as_deref(), Some("Meteors!"));
    }

    #[test]
    fn meteor_bad_expression_falls_back_to_default() {
        let action: MeteorShowerAction =
            serde_json::from_str(r#"{"amount": "event +"}"#).unwrap();
        let execution = action.execute(&Event::new(EventType::Donation, 20), &ExecParams::new());
        assert_eq!(
            execution.effect,
            Some(Effect::MeteorShower {
                radius: 100.0,
                count: 1
            })
        );
    }

    #[test]
    fn meteor_negative_count_clamps_to_zero() {
        let action: MeteorShowerAction =
            serde_json::from_str(r#"{"amount": "event"}"#).unwrap();
        let execution = action.execute(
            &Event::without_amount(EventType::TwitchFollow),
            &ExecParams::new(),
        );
        assert_eq!(
            execution.effect,
            Some(Effect::MeteorShower {
                radius: 100.0,
                count: 0
            })
        );
    }

    #[test]
    fn snap_defaults() {
        let action: SnapAction = serde_json::from_str(r#"{}"#).unwrap();
        let execution = action.execute(&Event::new(EventType::Donation, 5), &ExecParams::new());
        assert_eq!(
            execution.effect,
            Some(Effect::SnapDamage {
                vehicle: true,
                vehicle_percentage: 0.5,
                player_percentage: 0.5
            })
        );
    }

    #[test]
    fn conditions_deserialize_inside_action_payload() {
        let action: TogglePowerAction = serde_json::from_str(
            r#"{
                "message": "Lights out!",
                "conditions": [{"eventType": "twitch_bits", "threshold": 500}]
            }"#,
        )
        .unwrap();
        assert!(action.matches(&Event::new(EventType::TwitchBits, 500)));
        assert!(!action.matches(&Event::new(EventType::TwitchBits, 100)));
    }
}
