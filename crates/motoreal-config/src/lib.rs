//! motoreal-config
//!
//! Persistent user preferences, sync credentials and application home resolution.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{default_home, ConfigManager, HOME_ENV_VAR};
pub use model::{Config, DriveSettings, SyncSettings, WorkerSettings};
