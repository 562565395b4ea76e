use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::error::SessionError;
use super::runner::{SessionProvider, SqlSession, StatementReceipt};
use crate::config::EnvironmentConfig;

/// In-memory session that records submitted statements and fails on demand
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    failures: Vec<MockFailure>,
    submitted: Vec<String>,
    close_calls: usize,
    connect_error: Option<String>,
}

struct MockFailure {
    #[allow(clippy::type_complexity)]
    matcher: Box<dyn Fn(usize, &str) -> bool + Send + Sync>,
    message: String,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `n`th submitted statement (1-based, counted across the
    /// whole session)
    pub fn fail_on_call(&self, n: usize, message: &str) -> &Self {
        self.fail_when(move |call, _| call == n, message)
    }

    /// Reject every statement whose text contains `needle`
    pub fn fail_on_text(&self, needle: &str, message: &str) -> &Self {
        let needle = needle.to_string();
        self.fail_when(move |_, sql| sql.contains(&needle), message)
    }

    pub fn fail_when<F>(&self, matcher: F, message: &str) -> &Self
    where
        F: Fn(usize, &str) -> bool + Send + Sync + 'static,
    {
        self.state.lock().unwrap().failures.push(MockFailure {
            matcher: Box::new(matcher),
            message: message.to_string(),
        });
        self
    }

    /// Make `connect` fail with an authentication error
    pub fn fail_connect(&self, message: &str) -> &Self {
        self.state.lock().unwrap().connect_error = Some(message.to_string());
        self
    }

    /// Every statement submitted so far, including rejected ones
    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.failures.clear();
        state.submitted.clear();
        state.close_calls = 0;
        state.connect_error = None;
    }
}

#[async_trait]
impl SqlSession for MockSession {
    async fn execute(&self, sql: &str) -> Result<StatementReceipt, SessionError> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(sql.to_string());
        let call = state.submitted.len();

        if let Some(failure) = state.failures.iter().find(|f| (f.matcher)(call, sql)) {
            return Err(SessionError::statement(failure.message.clone()));
        }

        Ok(StatementReceipt {
            query_id: Some(format!("mock-{}", call)),
            message: None,
        })
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for MockSession {
    async fn connect(
        &self,
        _settings: &EnvironmentConfig,
    ) -> Result<Box<dyn SqlSession>, SessionError> {
        if let Some(message) = self.state.lock().unwrap().connect_error.clone() {
            return Err(SessionError::Authentication(message));
        }
        Ok(Box::new(self.clone()))
    }
}
