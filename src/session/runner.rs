use async_trait::async_trait;

use super::error::SessionError;
use crate::config::EnvironmentConfig;

/// What the database reported for an accepted statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementReceipt {
    /// Engine-side identifier of the statement, when the engine returns one
    pub query_id: Option<String>,
    pub message: Option<String>,
}

/// A live connection that executes one statement per call, in call order
#[async_trait]
pub trait SqlSession: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<StatementReceipt, SessionError>;

    /// Release the session. Called exactly once per acquired session,
    /// whether or not the run succeeded.
    async fn close(&self) -> Result<(), SessionError>;
}

/// Acquires sessions for an environment
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn connect(
        &self,
        settings: &EnvironmentConfig,
    ) -> Result<Box<dyn SqlSession>, SessionError>;
}
