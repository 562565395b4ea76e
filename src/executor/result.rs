//! Result types for statement execution

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::DeployError;

/// A statement the database rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    /// 1-based position of the statement in its script
    pub index: usize,
    pub label: String,
    /// Source line where the statement starts
    pub line: usize,
    pub source: Option<PathBuf>,
    /// Truncated statement text
    pub preview: String,
    /// Error reported by the session
    pub message: String,
}

impl StatementFailure {
    /// Where the statement lives, e.g. `#2 (TASK load) at tasks/load.sql:14`
    pub fn locator(&self) -> String {
        let mut locator = format!("#{} ({})", self.index, self.label);
        match &self.source {
            Some(path) => locator.push_str(&format!(" at {}:{}", path.display(), self.line)),
            None => locator.push_str(&format!(" at line {}", self.line)),
        }
        locator
    }
}

impl fmt::Display for StatementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Statement {} failed: {}", self.locator(), self.message)
    }
}

/// Outcome of one submitted statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded {
        index: usize,
        label: String,
        query_id: Option<String>,
        duration: Duration,
    },
    Failed(StatementFailure),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded { .. })
    }

    pub fn index(&self) -> usize {
        match self {
            ExecutionOutcome::Succeeded { index, .. } => *index,
            ExecutionOutcome::Failed(failure) => failure.index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Completed,
    /// The file has no statements
    Empty,
    Failed,
}

/// Per-file line of a batch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    /// Statements the file was split into (0 if it could not be split)
    pub statements: usize,
    pub succeeded: usize,
    pub status: FileStatus,
}

/// Aggregate of statement outcomes for a file or a whole run.
///
/// Execution is fail-fast, so at most one failure is ever recorded and it is
/// always the last thing that happened.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<ExecutionOutcome>,
    pub files: Vec<FileSummary>,
    pub failure: Option<DeployError>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result that failed before any statement was submitted
    pub fn failed(error: DeployError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: ExecutionOutcome) {
        self.outcomes.push(outcome);
    }

    /// Record the batch failure; the first recorded failure wins
    pub fn fail(&mut self, error: DeployError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    /// Merge a later result into this one
    pub fn absorb(&mut self, other: BatchResult) {
        self.outcomes.extend(other.outcomes);
        self.files.extend(other.files);
        if let Some(error) = other.failure {
            self.fail(error);
        }
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn first_failure(&self) -> Option<&DeployError> {
        self.failure.as_ref()
    }

    /// The rejected statement, if the batch stopped on one
    pub fn statement_failure(&self) -> Option<&StatementFailure> {
        self.outcomes.iter().find_map(|o| match o {
            ExecutionOutcome::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn take_failure(&mut self) -> Option<DeployError> {
        self.failure.take()
    }

    /// One-line count summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} statements attempted, {} succeeded, {} failed",
            self.attempted(),
            self.succeeded(),
            self.failed_count()
        );
        if !self.files.is_empty() {
            summary.push_str(&format!(" across {} files", self.files.len()));
        }
        summary
    }
}
