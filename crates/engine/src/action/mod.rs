//! Action contract and the built-in action variants.
//!
//! Actions are polymorphic: each type is registered in the
//! [`FactoryTable`](crate::store::FactoryTable) under a string discriminator
//! and constructed from its JSON payload during the store's resolve pass.
//! New action kinds plug in without touching the dispatch core.

mod builtin;
mod random;

pub use builtin::{EnableDampenersAction, MeteorShowerAction, SnapAction, TogglePowerAction};
pub use random::RandomAction;

use std::fmt;

use streamrig_core::{Event, ExecParams, Execution};

use crate::condition::Condition;

/// Base contract for all action variants.
///
/// `matches` is OR over the conditions (an action with no conditions matches
/// every event). `execute` is infallible: missing optional parameters fall
/// back to defaults, and authoring mistakes degrade to a no-op, never a
/// panic.
pub trait Action: fmt::Debug + Send + Sync {
    /// Chat message template announced when this action triggers.
    fn message(&self) -> &str;

    /// Conditions gating this action, OR-combined.
    fn conditions(&self) -> &[Condition];

    /// Produce this action's effect for the given event.
    fn execute(&self, event: &Event, params: &ExecParams) -> Execution;

    /// True iff the conditions list is empty or any condition matches.
    fn matches(&self, event: &Event) -> bool {
        let conditions = self.conditions();
        conditions.is_empty() || conditions.iter().any(|c| c.matches(event))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
