use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Statement {
        message: String,
        code: Option<String>,
        sql_state: Option<String>,
    },

    #[error("Statement timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected response from database: {0}")]
    Protocol(String),

    #[error("Session is already closed")]
    Closed,
}

impl SessionError {
    /// Create a statement rejection with only a message
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
            code: None,
            sql_state: None,
        }
    }

    /// Message suitable for statement failure reports, including the
    /// engine's error code when one was returned
    pub fn report_message(&self) -> String {
        match self {
            Self::Statement {
                message,
                code: Some(code),
                sql_state,
            } => match sql_state {
                Some(state) => format!("{} (code {}, SQL state {})", message, code, state),
                None => format!("{} (code {})", message, code),
            },
            other => other.to_string(),
        }
    }
}
