//! Sequential statement execution
//!
//! Statements are submitted one at a time, in scan order, on a single
//! session. The first rejected statement stops the batch: nothing after it
//! is submitted.

pub mod result;

pub use result::{BatchResult, ExecutionOutcome, FileStatus, FileSummary, StatementFailure};

use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::error::DeployError;
use crate::script::StatementUnit;
use crate::session::SqlSession;

/// Submits statements to one session, fail-fast
pub struct StatementExecutor<'a> {
    session: &'a dyn SqlSession,
    source: Option<PathBuf>,
}

impl<'a> StatementExecutor<'a> {
    pub fn new(session: &'a dyn SqlSession) -> Self {
        Self {
            session,
            source: None,
        }
    }

    /// Attribute failures to a script file
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Execute `units` in order, stopping at the first failure
    pub async fn execute(&self, units: &[StatementUnit]) -> BatchResult {
        let mut result = BatchResult::new();

        for unit in units {
            let label = unit.label();
            info!("Executing {}: {}", label, unit.preview());
            let started = Instant::now();

            match self.session.execute(&unit.text).await {
                Ok(receipt) => {
                    let duration = started.elapsed();
                    debug!(
                        "{} succeeded in {:?} (query id: {})",
                        label,
                        duration,
                        receipt.query_id.as_deref().unwrap_or("-")
                    );
                    result.record(ExecutionOutcome::Succeeded {
                        index: unit.index,
                        label,
                        query_id: receipt.query_id,
                        duration,
                    });
                }
                Err(err) => {
                    let failure = StatementFailure {
                        index: unit.index,
                        label,
                        line: unit.line,
                        source: self.source.clone(),
                        preview: unit.preview(),
                        message: err.report_message(),
                    };
                    error!("{}", failure);
                    result.record(ExecutionOutcome::Failed(failure.clone()));
                    result.fail(DeployError::ExecutionFailure(failure));
                    break;
                }
            }
        }

        result
    }
}
