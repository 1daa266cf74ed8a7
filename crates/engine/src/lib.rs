//! Live-event action rule engine.
//!
//! This crate provides:
//! - JSON action definitions with serde deserialization and an extensible
//!   action-type factory table
//! - A small expression language over the event magnitude for conditions
//!   and numeric action parameters
//! - Weighted random selection for composite actions
//! - A file-backed action store with hot-reload via `notify` watcher
//! - The handler facade with closest-lower-threshold fuzzy fallback

pub mod action;
pub mod condition;
pub mod error;
pub mod expr;
pub mod handler;
pub mod selector;
pub mod store;

pub use action::Action;
pub use condition::Condition;
pub use error::{EngineError, Result};
pub use handler::ActionHandler;
pub use selector::WeightedSelector;
pub use store::{ActionRegistry, ActionStore, FactoryTable};
