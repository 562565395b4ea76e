//! Session backed by the database's SQL REST API
//!
//! Each statement is one `POST /api/v2/statements` request. Long-running
//! statements answer `202 Accepted` with a statement handle, which is polled
//! until the statement completes. The API itself keeps no session state
//! between requests, so the current database, schema, warehouse and role are
//! tracked here and sent with every request; a successful `USE …` statement
//! updates them for the statements that follow.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::error::SessionError;
use super::runner::{SessionProvider, SqlSession, StatementReceipt};
use crate::config::EnvironmentConfig;

pub const ACCOUNT_VAR: &str = "SNOWFLAKE_ACCOUNT";
pub const TOKEN_VAR: &str = "SNOWFLAKE_TOKEN";
pub const TOKEN_TYPE_VAR: &str = "SNOWFLAKE_TOKEN_TYPE";
pub const HOST_VAR: &str = "SNOWFLAKE_HOST";

const DEFAULT_TOKEN_TYPE: &str = "OAUTH";
const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const STATEMENTS_PATH: &str = "/api/v2/statements";
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const PROBE_STATEMENT: &str = "SELECT CURRENT_VERSION()";

static USE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*USE\s+(?:(ROLE|WAREHOUSE|DATABASE|SCHEMA)\s+)?([^\s;]+)\s*;?\s*$")
        .expect("Invalid regex pattern")
});

/// Endpoint and token for the SQL API
#[derive(Clone)]
pub struct HttpCredentials {
    pub base_url: String,
    pub token: String,
    pub token_type: String,
}

impl fmt::Debug for HttpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCredentials")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl HttpCredentials {
    /// Read credentials from `SNOWFLAKE_*` environment variables
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get(TOKEN_VAR).ok_or_else(|| SessionError::MissingCredential(TOKEN_VAR.into()))?;

        let base_url = match get(HOST_VAR) {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("https://{}", host.trim_end_matches('/')),
            None => {
                let account = get(ACCOUNT_VAR)
                    .ok_or_else(|| SessionError::MissingCredential(ACCOUNT_VAR.into()))?;
                format!("https://{}.snowflakecomputing.com", account.to_lowercase())
            }
        };

        Ok(Self {
            base_url,
            token,
            token_type: get(TOKEN_TYPE_VAR).unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
        })
    }
}

/// Context sent with every statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
}

impl SessionContext {
    pub fn from_settings(settings: &EnvironmentConfig) -> Self {
        Self {
            database: Some(settings.database.clone()),
            schema: settings.schema.clone(),
            warehouse: Some(settings.warehouse.clone()),
            role: Some(settings.role.clone()),
        }
    }

    /// Apply the effect of a successful `USE …` statement. Returns whether
    /// the statement changed the context.
    pub fn apply_use(&mut self, sql: &str) -> bool {
        let Some(caps) = USE_REGEX.captures(sql) else {
            return false;
        };
        let name = caps[2].to_string();
        let kind = caps
            .get(1)
            .map(|m| m.as_str().to_ascii_uppercase())
            .unwrap_or_else(|| "DATABASE".to_string());

        match kind.as_str() {
            "ROLE" => self.role = Some(name),
            "WAREHOUSE" => self.warehouse = Some(name),
            "SCHEMA" => match name.split_once('.') {
                Some((database, schema)) if !name.starts_with('"') => {
                    self.database = Some(database.to_string());
                    self.schema = Some(schema.to_string());
                }
                _ => self.schema = Some(name),
            },
            _ => {
                self.database = Some(name);
                self.schema = None;
            }
        }
        true
    }
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    sql_state: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    statement_handle: Option<String>,
}

enum ResponseState {
    Complete(StatementResponse),
    Running(String),
    Failed(SessionError),
}

/// Map one HTTP response to a statement state. `body` is the decoded JSON
/// body, or the decoding error.
fn classify(
    status: StatusCode,
    body: Result<StatementResponse, String>,
    timeout: Option<Duration>,
) -> ResponseState {
    let body = match body {
        Ok(body) => body,
        Err(e) if status == StatusCode::OK => {
            return ResponseState::Failed(SessionError::Protocol(format!(
                "unreadable response body: {}",
                e
            )));
        }
        Err(_) => StatementResponse::default(),
    };

    match status {
        StatusCode::OK => ResponseState::Complete(body),
        StatusCode::ACCEPTED => match body.statement_handle {
            Some(handle) => ResponseState::Running(handle),
            None => ResponseState::Failed(SessionError::Protocol(
                "202 Accepted without a statement handle".to_string(),
            )),
        },
        StatusCode::UNPROCESSABLE_ENTITY => ResponseState::Failed(SessionError::Statement {
            message: body
                .message
                .unwrap_or_else(|| "statement failed".to_string()),
            code: body.code,
            sql_state: body.sql_state,
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ResponseState::Failed(
            SessionError::Authentication(body.message.unwrap_or_else(|| status.to_string())),
        ),
        StatusCode::REQUEST_TIMEOUT => {
            ResponseState::Failed(SessionError::Timeout(timeout.unwrap_or_default()))
        }
        other => ResponseState::Failed(SessionError::Protocol(format!(
            "HTTP {}: {}",
            other,
            body.message.unwrap_or_default()
        ))),
    }
}

/// Session over the SQL REST API
pub struct HttpSqlSession {
    client: Client,
    credentials: HttpCredentials,
    context: Mutex<SessionContext>,
    statement_timeout: Option<Duration>,
    closed: AtomicBool,
}

impl HttpSqlSession {
    pub fn new(
        credentials: HttpCredentials,
        context: SessionContext,
        statement_timeout: Option<Duration>,
    ) -> Result<Self, SessionError> {
        let client = Client::builder()
            .user_agent(concat!("sqldeploy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            credentials,
            context: Mutex::new(context),
            statement_timeout,
            closed: AtomicBool::new(false),
        })
    }

    async fn submit(
        &self,
        sql: &str,
        context: &SessionContext,
    ) -> Result<StatementResponse, SessionError> {
        let request = StatementRequest {
            statement: sql,
            timeout: self.statement_timeout.map(|t| t.as_secs()),
            database: context.database.as_deref(),
            schema: context.schema.as_deref(),
            warehouse: context.warehouse.as_deref(),
            role: context.role.as_deref(),
        };

        let url = format!("{}{}", self.credentials.base_url, STATEMENTS_PATH);
        trace!("POST {}", url);
        let mut response = self
            .client
            .post(&url)
            .bearer_auth(&self.credentials.token)
            .header(TOKEN_TYPE_HEADER, &self.credentials.token_type)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        loop {
            let status = response.status();
            let body = response
                .json::<StatementResponse>()
                .await
                .map_err(|e| e.to_string());

            match classify(status, body, self.statement_timeout) {
                ResponseState::Complete(body) => return Ok(body),
                ResponseState::Failed(err) => return Err(err),
                ResponseState::Running(handle) => {
                    trace!("Statement {} still running", handle);
                    tokio::time::sleep(POLL_INTERVAL).await;
                    response = self
                        .client
                        .get(format!("{}/{}", url, handle))
                        .bearer_auth(&self.credentials.token)
                        .header(TOKEN_TYPE_HEADER, &self.credentials.token_type)
                        .header(reqwest::header::ACCEPT, "application/json")
                        .send()
                        .await?;
                }
            }
        }
    }
}

#[async_trait]
impl SqlSession for HttpSqlSession {
    async fn execute(&self, sql: &str) -> Result<StatementReceipt, SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }

        let context = self.context.lock().await.clone();
        let response = self.submit(sql, &context).await?;

        let mut context = self.context.lock().await;
        if context.apply_use(sql) {
            debug!("Session context is now {:?}", *context);
        }

        Ok(StatementReceipt {
            query_id: response.statement_handle,
            message: response.message,
        })
    }

    async fn close(&self) -> Result<(), SessionError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed session to {}", self.credentials.base_url);
        }
        Ok(())
    }
}

/// Provides [`HttpSqlSession`]s, checking credentials with a probe statement
#[derive(Debug, Default, Clone)]
pub struct HttpSessionProvider {
    credentials: Option<HttpCredentials>,
}

impl HttpSessionProvider {
    /// Credentials are read from the environment at connect time
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: HttpCredentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn connect(
        &self,
        settings: &EnvironmentConfig,
    ) -> Result<Box<dyn SqlSession>, SessionError> {
        let credentials = match &self.credentials {
            Some(credentials) => credentials.clone(),
            None => HttpCredentials::from_env()?,
        };
        debug!("Connecting to {}", credentials.base_url);

        let session = HttpSqlSession::new(
            credentials,
            SessionContext::from_settings(settings),
            settings.statement_timeout,
        )?;
        session.execute(PROBE_STATEMENT).await?;

        Ok(Box::new(session))
    }
}
