//! Action effects and the deferred-effect queue.
//!
//! The engine never touches the game host directly: executing an action
//! yields an [`Execution`] describing the effect, and the host decides
//! whether to apply it immediately or park it in [`PendingEffects`] until
//! the session is ready.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Caller-supplied named values passed to `Action::execute` (for example a
/// resolved target-entity handle under `"target"`). Actions must treat any
/// missing key as "use default".
pub type ExecParams = HashMap<String, serde_json::Value>;

/// A host-side effect produced by executing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Spawn a meteor shower around the target.
    MeteorShower { radius: f64, count: u32 },
    /// Damage a percentage of the player's or vehicle's blocks.
    SnapDamage {
        vehicle: bool,
        vehicle_percentage: f64,
        player_percentage: f64,
    },
    /// Force inertia dampeners on for the controlled entity.
    EnableDampeners,
    /// Toggle the reactors of the controlled ship.
    TogglePower,
    /// Host-defined effect from an externally registered action type.
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

/// Outcome of executing one action: the chat message to announce (composite
/// actions substitute the chosen sub-action's message here) and the effect
/// for the host to apply, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub message: Option<String>,
    pub effect: Option<Effect>,
}

impl Execution {
    /// An execution with the given message (empty becomes `None`) and effect.
    pub fn of(message: &str, effect: Effect) -> Self {
        Self {
            message: if message.is_empty() {
                None
            } else {
                Some(message.to_string())
            },
            effect: Some(effect),
        }
    }

    /// A no-op execution carrying only a diagnostic message.
    pub fn message_only(message: &str) -> Self {
        Self {
            message: if message.is_empty() {
                None
            } else {
                Some(message.to_string())
            },
            effect: None,
        }
    }
}

/// Bounded FIFO of effects issued before the host was ready to apply them.
///
/// The host drains the queue once on startup; afterwards it applies effects
/// directly. When full, the oldest entry is dropped.
#[derive(Debug)]
pub struct PendingEffects {
    queue: Mutex<VecDeque<Effect>>,
    capacity: usize,
}

impl PendingEffects {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Enqueue an effect, evicting the oldest entry when at capacity.
    pub fn push(&self, effect: Effect) {
        let mut queue = self.queue.lock().expect("pending effects lock poisoned");
        if queue.len() >= self.capacity {
            let dropped = queue.pop_front();
            warn!(?dropped, "pending effect queue full, dropping oldest");
        }
        queue.push_back(effect);
    }

    /// Take all pending effects, oldest first.
    pub fn drain(&self) -> Vec<Effect> {
        let mut queue = self.queue.lock().expect("pending effects lock poisoned");
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().expect("pending effects lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_of_empty_message_is_none() {
        let execution = Execution::of("", Effect::TogglePower);
        assert_eq!(execution.message, None);
        assert_eq!(execution.effect, Some(Effect::TogglePower));
    }

    #[test]
    fn pending_effects_drain_in_order() {
        let pending = PendingEffects::new(4);
        pending.push(Effect::EnableDampeners);
        pending.push(Effect::TogglePower);
        assert_eq!(pending.len(), 2);
        assert_eq!(
            pending.drain(),
            vec![Effect::EnableDampeners, Effect::TogglePower]
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn pending_effects_evict_oldest_when_full() {
        let pending = PendingEffects::new(2);
        pending.push(Effect::EnableDampeners);
        pending.push(Effect::TogglePower);
        pending.push(Effect::MeteorShower {
            radius: 100.0,
            count: 1,
        });
        let drained = pending.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Effect::TogglePower);
    }
}
