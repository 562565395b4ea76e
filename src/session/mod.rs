//! Database sessions
//!
//! Statements are submitted through the [`SqlSession`] trait so the executor
//! never depends on a concrete transport. [`SessionProvider`]s acquire
//! sessions for an environment.

pub mod dry_run;
pub mod error;
pub mod http;
pub mod mock;
pub mod runner;

pub use dry_run::{DryRunProvider, DryRunSession};
pub use error::SessionError;
pub use http::{HttpCredentials, HttpSessionProvider, HttpSqlSession, SessionContext};
pub use mock::MockSession;
pub use runner::{SessionProvider, SqlSession, StatementReceipt};

/// Pick the provider for a run
pub fn provider(dry_run: bool) -> Box<dyn SessionProvider> {
    if dry_run {
        Box::new(DryRunProvider)
    } else {
        Box::new(HttpSessionProvider::from_env())
    }
}
