//! # sqldeploy
//!
//! Deploys directories of SQL scripts to a database environment, one
//! statement at a time, stopping at the first failure.
//!
//! ## Usage
//!
//! ```bash
//! sqldeploy deploy --environment prod [--category tables] [--dry-run]
//! sqldeploy task --environment prod --task-name nightly_load
//! sqldeploy scan scripts/prod/tasks
//! ```
//!
//! ## Modules
//!
//! - `script` - Placeholder substitution and statement splitting
//! - `executor` - Sequential, fail-fast statement execution
//! - `deploy` - File, directory and category orchestration with scoped sessions
//! - `session` - Database session abstraction (SQL REST API, dry run, mock)
//! - `config` - Per-environment YAML settings
//! - `error` - Error types and codes
//! - `app` - Logging and fatal error handling for the binary
//! - `cli` - Command-line interface
pub mod app;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod executor;
pub mod script;
pub mod session;

pub use error::{DeployError, ErrorCode};
