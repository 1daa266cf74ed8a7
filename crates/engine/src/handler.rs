//! Engine facade: event evaluation against the current registry snapshot.

use std::sync::Arc;

use tracing::{debug, warn};

use streamrig_core::{Event, FuzzyCategory, Settings};

use crate::action::Action;
use crate::error::Result;
use crate::store::{ActionStore, FactoryTable};

/// Owns the action store and answers "which actions fire for this event".
///
/// Evaluation is synchronous and lock-free beyond one registry snapshot per
/// call; two concurrent evaluations may observe different registry versions
/// across a reload, but never a partial one.
pub struct ActionHandler {
    store: ActionStore,
    settings: Settings,
}

impl ActionHandler {
    pub fn new(store: ActionStore, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// The underlying store (for reloads and snapshots).
    pub fn store(&self) -> &ActionStore {
        &self.store
    }

    /// Register an action-type factory. Must happen before a load that
    /// references the type.
    pub fn register<F>(&self, kind: &str, factory: F)
    where
        F: Fn(&serde_json::Value, &FactoryTable) -> Result<Arc<dyn Action>>
            + Send
            + Sync
            + 'static,
    {
        self.store.factories().register(kind, factory);
    }

    /// All actions matching the event, in rule-file order.
    ///
    /// When nothing matches and the event's category has fuzzy matching
    /// enabled, falls back to the action with the greatest literal threshold
    /// still at or below the event's amount (first in file order on a tie).
    /// An empty or not-yet-loaded registry yields an empty list.
    pub fn get_actions(&self, event: &Event) -> Vec<Arc<dyn Action>> {
        let registry = self.store.snapshot();

        let matched: Vec<Arc<dyn Action>> = registry
            .values()
            .filter(|action| action.matches(event))
            .cloned()
            .collect();
        if !matched.is_empty() {
            return matched;
        }

        if !self.fuzzy_enabled(event) || event.amount < 0 {
            return Vec::new();
        }

        // Closest-lower-bound fallback over literal thresholds only; free-form
        // expressions are excluded on purpose.
        let mut best: Option<(i64, Arc<dyn Action>)> = None;
        for action in registry.values() {
            for condition in action.conditions() {
                if condition.event_type != event.event_type || condition.expression.is_some() {
                    continue;
                }
                let Some(threshold) = condition.threshold else {
                    continue;
                };
                if threshold > event.amount {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some((best_threshold, _)) => threshold > *best_threshold,
                };
                if better {
                    best = Some((threshold, Arc::clone(action)));
                }
            }
        }

        match best {
            Some((threshold, action)) => {
                debug!(%event, threshold, "fuzzy-matched action with closest lower threshold");
                vec![action]
            }
            None => Vec::new(),
        }
    }

    /// Construct a one-off action from a type discriminator and inline
    /// parameter payload (for callers that don't reference a named registry
    /// entry). Unknown type or unbindable payload yields `None`.
    pub fn get_action(
        &self,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Option<Arc<dyn Action>> {
        match self.store.factories().build(kind, payload) {
            Ok(action) => Some(action),
            Err(e) => {
                warn!(kind, error = %e, "failed to resolve ad-hoc action");
                None
            }
        }
    }

    fn fuzzy_enabled(&self, event: &Event) -> bool {
        match event.fuzzy_category() {
            Some(FuzzyCategory::Donations) => self.settings.fuzzy_donations,
            Some(FuzzyCategory::Subscriptions) => self.settings.fuzzy_subs,
            Some(FuzzyCategory::Bits) => self.settings.fuzzy_bits,
            None => false,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use streamrig_core::EventType;
    use tempfile::TempDir;

    const THRESHOLD_ACTIONS: &str = r#"{
        "small": {
            "type": "dampeners",
            "message": "small",
            "conditions": [{"eventType": "donation", "threshold": 10}]
        },
        "medium": {
            "type": "dampeners",
            "message": "medium",
            "conditions": [{"eventType": "donation", "threshold": 20}]
        },
        "large": {
            "type": "dampeners",
            "message": "large",
            "conditions": [{"eventType": "donation", "threshold": 50}]
        }
    }"#;

    fn handler_with(contents: &str, settings: Settings) -> (TempDir, ActionHandler) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, contents).unwrap();
        let store = ActionStore::new(path);
        store.load().unwrap();
        (dir, ActionHandler::new(store, settings))
    }

    fn fuzzy_donations() -> Settings {
        Settings {
            fuzzy_donations: true,
            ..Settings::default()
        }
    }

    #[test]
    fn empty_registry_yields_empty() {
        let dir = TempDir::new().unwrap();
        let store = ActionStore::new(dir.path().join("events.json"));
        let handler = ActionHandler::new(store, Settings::default());
        assert!(handler
            .get_actions(&Event::new(EventType::Donation, 20))
            .is_empty());
    }

    #[test]
    fn exact_threshold_match_wins() {
        let (_dir, handler) = handler_with(THRESHOLD_ACTIONS, fuzzy_donations());
        let actions = handler.get_actions(&Event::new(EventType::Donation, 20));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].message(), "medium");
    }

    #[test]
    fn fuzzy_falls_back_to_closest_lower_threshold() {
        let (_dir, handler) = handler_with(THRESHOLD_ACTIONS, fuzzy_donations());
        let actions = handler.get_actions(&Event::new(EventType::Donation, 35));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].message(), "medium");
    }

    #[test]
    fn fuzzy_finds_nothing_below_lowest_threshold() {
        let (_dir, handler) = handler_with(THRESHOLD_ACTIONS, fuzzy_donations());
        assert!(handler
            .get_actions(&Event::new(EventType::Donation, 5))
            .is_empty());
    }

    #[test]
    fn fuzzy_disabled_means_no_fallback() {
        let (_dir, handler) = handler_with(THRESHOLD_ACTIONS, Settings::default());
        assert!(handler
            .get_actions(&Event::new(EventType::Donation, 35))
            .is_empty());
    }

    #[test]
    fn fuzzy_never_applies_to_expressions_or_other_types() {
        let (_dir, handler) = handler_with(
            r#"{
                "expr": {
                    "type": "dampeners",
                    "message": "expr",
                    "conditions": [{"eventType": "donation", "expression": "event == 100"}]
                },
                "bits": {
                    "type": "dampeners",
                    "message": "bits",
                    "conditions": [{"eventType": "twitch_bits", "threshold": 10}]
                }
            }"#,
            fuzzy_donations(),
        );
        // The expression condition would match 100 exactly but is excluded
        // from the fallback; the bits threshold targets another event type.
        assert!(handler
            .get_actions(&Event::new(EventType::Donation, 150))
            .is_empty());
    }

    #[test]
    fn fuzzy_category_respects_per_category_switches() {
        let settings = Settings {
            fuzzy_bits: true,
            ..Settings::default()
        };
        let (_dir, handler) = handler_with(
            r#"{
                "cheer": {
                    "type": "dampeners",
                    "message": "cheer",
                    "conditions": [{"eventType": "twitch_bits", "threshold": 100}]
                }
            }"#,
            settings,
        );
        let actions = handler.get_actions(&Event::new(EventType::TwitchBits, 250));
        assert_eq!(actions.len(), 1);

        // Donations stay strict.
        assert!(handler
            .get_actions(&Event::new(EventType::Donation, 250))
            .is_empty());
    }

    #[test]
    fn multiple_matches_preserve_file_order() {
        let (_dir, handler) = handler_with(
            r#"{
                "second": {
                    "type": "dampeners",
                    "message": "second",
                    "conditions": [{"eventType": "twitch_follow"}]
                },
                "first": {
                    "type": "dampeners",
                    "message": "first",
                    "conditions": [{"eventType": "twitch_follow"}]
                }
            }"#,
            Settings::default(),
        );
        let actions = handler.get_actions(&Event::without_amount(EventType::TwitchFollow));
        let messages: Vec<&str> = actions.iter().map(|a| a.message()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[test]
    fn get_action_builds_ad_hoc_actions() {
        let (_dir, handler) = handler_with("{}", Settings::default());
        let action = handler
            .get_action("meteors", &serde_json::json!({"message": "hi", "radius": 20.0}))
            .unwrap();
        assert_eq!(action.message(), "hi");
    }

    #[test]
    fn get_action_unknown_type_is_none() {
        let (_dir, handler) = handler_with("{}", Settings::default());
        assert!(handler
            .get_action("unknown-type", &serde_json::json!({}))
            .is_none());
    }

    #[test]
    fn get_action_bad_payload_is_none() {
        let (_dir, handler) = handler_with("{}", Settings::default());
        assert!(handler
            .get_action("meteors", &serde_json::json!({"radius": "wide"}))
            .is_none());
    }
}
