//! Composite action delegating to one weighted-random sub-action.

use std::sync::Arc;

use rand::Rng;
use serde::Deserialize;
use tracing::warn;

use streamrig_core::{Event, ExecParams, Execution};

use crate::condition::Condition;
use crate::error::Result;
use crate::selector::WeightedSelector;
use crate::store::FactoryTable;

use super::Action;

/// Diagnostic message when no sub-action resolved.
pub(crate) const NO_SUB_ACTIONS_MESSAGE: &str = "No action to randomize from";

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RawSubAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_weight")]
    weight: f64,
    action: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawComposite {
    #[serde(default)]
    message: String,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    actions: Vec<RawSubAction>,
}

/// Picks one sub-action per trigger, weighted.
///
/// Sub-actions are resolved through the factory table during the store's
/// resolve pass, so the selector index is fully built before the registry
/// snapshot is published. A sub-action that fails to resolve is skipped
/// with a warning; its siblings still load. With zero resolved sub-actions,
/// `execute` is a safe no-op announcing a diagnostic message.
#[derive(Debug)]
pub struct RandomAction {
    message: String,
    conditions: Vec<Condition>,
    selector: WeightedSelector<Arc<dyn Action>>,
}

impl RandomAction {
    /// Resolve a composite definition against the live factory table.
    pub fn resolve(payload: &serde_json::Value, factories: &FactoryTable) -> Result<Self> {
        let raw: RawComposite = serde_json::from_value(payload.clone())?;

        let mut selector = WeightedSelector::new();
        for sub in &raw.actions {
            match factories.build(&sub.kind, &sub.action) {
                Ok(action) => selector.add(action, sub.weight),
                Err(e) => {
                    warn!(kind = %sub.kind, error = %e, "skipping sub-action that failed to resolve");
                }
            }
        }
        selector.build();

        let message = if selector.is_empty() {
            NO_SUB_ACTIONS_MESSAGE.to_string()
        } else {
            raw.message
        };

        Ok(Self {
            message,
            conditions: raw.conditions,
            selector,
        })
    }

    /// Number of resolved sub-actions.
    pub fn sub_action_count(&self) -> usize {
        self.selector.len()
    }

    /// Execute with an injected RNG; the chosen sub-action's execution (and
    /// message) propagates upward.
    pub fn execute_with<R: Rng + ?Sized>(
        &self,
        event: &Event,
        params: &ExecParams,
        rng: &mut R,
    ) -> Execution {
        match self.selector.select(rng) {
            Some(action) => action.execute(event, params),
            None => Execution::message_only(&self.message),
        }
    }
}

impl Action for RandomAction {
    fn message(&self) -> &str {
        &self.message
    }

    fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    fn execute(&self, event: &Event, params: &ExecParams) -> Execution {
        self.execute_with(event, params, &mut rand::thread_rng())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
