//! Process configuration and externally managed settings.
//!
//! - `env`: static configuration from `CASA_*` environment variables.
//! - `store`: cached settings rows (search filters) fetched from a remote table.

mod env;
mod store;

pub use env::{EnvConfig, MAX_SHEETS};
pub use store::SettingsStore;
