//! Configuration loading, layering, and validation.

mod loader;
mod types;
mod validation;

pub use loader::{load_config, load_env_file, ConfigError, Overrides};
pub use types::*;
pub use validation::validate_config;
