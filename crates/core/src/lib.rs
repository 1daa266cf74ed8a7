pub mod config;
pub mod effects;
pub mod event;

pub use config::{EventMessages, Settings, SettingsError};
pub use effects::*;
pub use event::*;
