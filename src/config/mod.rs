//! Deployment configuration
//!
//! Environment settings live in `<config_dir>/<environment>.yml`; see
//! [`environment`] for the format.

pub mod environment;

pub use environment::{EnvironmentConfig, DEFAULT_CATEGORIES};

/// Default directory holding `<environment>.yml` files
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Default root of `<environment>/<category>/*.sql` scripts
pub const DEFAULT_SCRIPTS_DIR: &str = "scripts";
