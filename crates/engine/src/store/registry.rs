//! Action-type factory table and registry resolution.
//!
//! Loading is two-pass: the file deserializes into [`RawAction`] records
//! (type discriminator plus untouched payload), then a resolve pass turns
//! each record into a live action through the factory registered for its
//! type. Factories receive the table itself so composite actions can
//! resolve nested definitions; forward references are a non-issue because
//! nested actions are inline payloads, not name references.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::action::{
    Action, EnableDampenersAction, MeteorShowerAction, RandomAction, SnapAction,
    TogglePowerAction,
};
use crate::error::{EngineError, Result};

/// All resolved actions of one load cycle, keyed by action name in rule-file
/// order. Built once per load and treated as an immutable snapshot.
pub type ActionRegistry = IndexMap<String, Arc<dyn Action>>;

/// Constructor for one action type: payload in, live action out.
pub type ActionFactory =
    Arc<dyn Fn(&serde_json::Value, &FactoryTable) -> Result<Arc<dyn Action>> + Send + Sync>;

/// Raw first-pass record for one named action definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining fields, handed to the type's factory untouched.
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

/// Mapping from action-type discriminator to constructor.
///
/// Types must be registered before any load that references them.
pub struct FactoryTable {
    factories: RwLock<HashMap<String, ActionFactory>>,
}

impl FactoryTable {
    /// Empty table with no registered types.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Table with the built-in action types registered under their
    /// rule-file discriminators.
    pub fn with_builtins() -> Self {
        let table = Self::new();
        table.register_typed::<MeteorShowerAction>("meteors");
        table.register_typed::<SnapAction>("snap");
        table.register_typed::<EnableDampenersAction>("dampeners");
        table.register_typed::<TogglePowerAction>("power");
        table.register("random", |payload, factories| {
            Ok(Arc::new(RandomAction::resolve(payload, factories)?) as Arc<dyn Action>)
        });
        table
    }

    /// Register a factory for a type discriminator, replacing any previous
    /// registration.
    pub fn register<F>(&self, kind: &str, factory: F)
    where
        F: Fn(&serde_json::Value, &FactoryTable) -> Result<Arc<dyn Action>>
            + Send
            + Sync
            + 'static,
    {
        self.factories
            .write()
            .expect("factory table lock poisoned")
            .insert(kind.to_string(), Arc::new(factory));
    }

    /// Register a plain serde-deserializable action type.
    pub fn register_typed<A>(&self, kind: &str)
    where
        A: Action + DeserializeOwned + 'static,
    {
        self.register(kind, |payload, _| {
            let action: A = serde_json::from_value(payload.clone())?;
            Ok(Arc::new(action) as Arc<dyn Action>)
        });
    }

    /// True when a factory is registered for the discriminator.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories
            .read()
            .expect("factory table lock poisoned")
            .contains_key(kind)
    }

    /// Construct a single action from a type discriminator and payload.
    ///
    /// Fails when the type is unregistered or the payload does not bind to
    /// the type's parameter shape.
    pub fn build(&self, kind: &str, payload: &serde_json::Value) -> Result<Arc<dyn Action>> {
        let factory = {
            let guard = self.factories.read().expect("factory table lock poisoned");
            guard.get(kind).cloned()
        };
        // Guard dropped before invoking: composite factories re-enter `build`.
        match factory {
            Some(factory) => factory(payload, self),
            None => Err(EngineError::UnknownActionType(kind.to_string())),
        }
    }
}

impl Default for FactoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<String> = self
            .factories
            .read()
            .expect("factory table lock poisoned")
            .keys()
            .cloned()
            .collect();
        f.debug_struct("FactoryTable").field("kinds", &kinds).finish()
    }
}

/// Resolve raw definitions into a fresh registry.
///
/// A definition whose type is unknown or whose payload fails to bind is
/// skipped with a warning; the rest of the file still loads.
pub fn resolve_registry(
    raw: IndexMap<String, RawAction>,
    factories: &FactoryTable,
) -> ActionRegistry {
    let mut registry = ActionRegistry::with_capacity(raw.len());
    for (name, definition) in raw {
        match factories.build(&definition.kind, &definition.payload) {
            Ok(action) => {
                registry.insert(name, action);
            }
            Err(e) => {
                warn!(action = %name, kind = %definition.kind, error = %e, "skipping action definition");
            }
        }
    }
    registry
}

// ── Tests ───────────────────────────────────────────────────────────
