//! File-backed action store with hot-reload via `notify` watcher.
//!
//! The JSON actions file maps action names to typed definitions. Each load
//! resolves the whole file into a fresh immutable registry snapshot that is
//! published with one atomic swap, so in-flight evaluations are never torn
//! by a reload.

mod core;
mod registry;
mod watcher;


pub use self::core::ActionStore;
pub use self::registry::{resolve_registry, ActionFactory, ActionRegistry, FactoryTable, RawAction};
