use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::error::SessionError;
use super::runner::{SessionProvider, SqlSession, StatementReceipt};
use crate::config::EnvironmentConfig;
use crate::script::statement::{preview, PREVIEW_CHARS};

/// Session that accepts every statement without contacting a database
#[derive(Debug, Default)]
pub struct DryRunSession {
    statements: AtomicUsize,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SqlSession for DryRunSession {
    async fn execute(&self, sql: &str) -> Result<StatementReceipt, SessionError> {
        let n = self.statements.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[dry-run] {}", preview(sql, PREVIEW_CHARS));
        Ok(StatementReceipt {
            query_id: None,
            message: Some(format!("dry run #{}", n)),
        })
    }

    async fn close(&self) -> Result<(), SessionError> {
        info!(
            "[dry-run] session closed after {} statements",
            self.statement_count()
        );
        Ok(())
    }
}

/// Provides [`DryRunSession`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunProvider;

#[async_trait]
impl SessionProvider for DryRunProvider {
    async fn connect(
        &self,
        settings: &EnvironmentConfig,
    ) -> Result<Box<dyn SqlSession>, SessionError> {
        info!(
            "[dry-run] would connect as role {} on warehouse {} (database {})",
            settings.role, settings.warehouse, settings.database
        );
        Ok(Box::new(DryRunSession::new()))
    }
}
