use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

use crate::executor::StatementFailure;
use crate::script::ScanError;
use crate::session::SessionError;

/// The unified error type for a deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(
        "[E{:04}] Could not acquire a database session: {}",
        ErrorCode::SESSION_ACQUISITION_FAILED,
        .0
    )]
    ResourceAcquisition(#[source] SessionError),

    #[error("[E{:04}] Cannot read {}: {source}", ErrorCode::STORAGE_IO_ERROR, .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{:04}] Cannot split {}: {source}", scan_code(.source), display_source(.path))]
    Scan {
        path: Option<PathBuf>,
        #[source]
        source: ScanError,
    },

    #[error("[E{:04}] {}", ErrorCode::EXEC_STATEMENT_FAILED, .0)]
    ExecutionFailure(StatementFailure),

    #[error("[E{:04}] Deployment interrupted", ErrorCode::OTHER_INTERRUPTED)]
    Interrupted,
}

fn scan_code(err: &ScanError) -> u16 {
    match err {
        ScanError::UnterminatedBlock { .. } => ErrorCode::SCAN_UNTERMINATED_BLOCK,
        ScanError::EmptyStatementSet => ErrorCode::SCAN_EMPTY_STATEMENT_SET,
    }
}

fn display_source(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "script".to_string(),
    }
}

impl DeployError {
    /// Create a configuration error with specific code and path
    pub fn config_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a scan error attributed to a script file
    pub fn scan(path: Option<&Path>, source: ScanError) -> Self {
        Self::Scan {
            path: path.map(Path::to_path_buf),
            source,
        }
    }

    /// Create an I/O error for a script path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Add a source error to a configuration error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        if let Self::Config { source: src, .. } = &mut self {
            *src = Some(source.into());
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. } => *code,
            Self::ResourceAcquisition(_) => ErrorCode::SESSION_ACQUISITION_FAILED,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::STORAGE_NOT_FOUND
            }
            Self::Io { .. } => ErrorCode::STORAGE_IO_ERROR,
            Self::Scan { source, .. } => scan_code(source),
            Self::ExecutionFailure(_) => ErrorCode::EXEC_STATEMENT_FAILED,
            Self::Interrupted => ErrorCode::OTHER_INTERRUPTED,
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::ResourceAcquisition(_) => 3,
            Self::Io { .. } => 4,
            Self::ExecutionFailure(_) => 5,
            Self::Scan { .. } => 6,
            Self::Interrupted => 130,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, path, .. } => match path {
                Some(p) => format!("Configuration problem in {}: {}", p.display(), message),
                None => format!("Configuration problem: {}", message),
            },
            Self::ResourceAcquisition(err) => format!("Could not connect: {}", err),
            Self::Io { path, source } => format!("Cannot read {}: {}", path.display(), source),
            Self::Scan { path, source } => {
                format!("Cannot split {} into statements: {}", display_source(path), source)
            }
            Self::ExecutionFailure(failure) => {
                let mut msg = format!("Statement {} failed", failure.locator());
                msg.push_str(&format!(": {}\n  SQL: {}", failure.message, failure.preview));
                msg
            }
            Self::Interrupted => "Deployment interrupted".to_string(),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut msg = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        msg
    }
}
