//! Deployment orchestration
//!
//! [`Deployer`] applies the scanner and executor to scripts, files,
//! directories and category trees. [`with_session`] scopes one database
//! session around a run and guarantees it is closed.

pub mod layout;
pub mod orchestrator;

pub use orchestrator::{Deployer, Progress};

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EnvironmentConfig;
use crate::error::DeployError;
use crate::session::{SessionProvider, SqlSession};

/// Acquire a session, run `run` with it and close the session afterwards.
///
/// The run is raced against Ctrl-C; an interrupt yields
/// [`DeployError::Interrupted`] once the session has been closed.
pub async fn with_session<T, F, Fut>(
    provider: &dyn SessionProvider,
    settings: &EnvironmentConfig,
    run: F,
) -> Result<T, DeployError>
where
    F: FnOnce(Arc<dyn SqlSession>) -> Fut,
    Fut: Future<Output = T>,
{
    with_session_until(provider, settings, ctrl_c(), run).await
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {}
        Err(e) => {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// [`with_session`] with a caller-supplied interrupt signal
pub async fn with_session_until<T, F, Fut, S>(
    provider: &dyn SessionProvider,
    settings: &EnvironmentConfig,
    interrupt: S,
    run: F,
) -> Result<T, DeployError>
where
    F: FnOnce(Arc<dyn SqlSession>) -> Fut,
    Fut: Future<Output = T>,
    S: Future<Output = ()>,
{
    debug!("Connecting to {} as {}", settings.database, settings.role);
    let session: Arc<dyn SqlSession> = provider
        .connect(settings)
        .await
        .map_err(DeployError::ResourceAcquisition)?
        .into();
    info!("Session acquired for environment {}", settings.name);

    let outcome = tokio::select! {
        value = run(Arc::clone(&session)) => Ok(value),
        _ = interrupt => {
            warn!("Interrupted, closing session");
            Err(DeployError::Interrupted)
        }
    };

    match session.close().await {
        Ok(()) => debug!("Session closed"),
        Err(e) => warn!("Failed to close session: {}", e),
    }
    outcome
}
