//! Task command implementation
//!
//! Deploys one task script, `<scripts_dir>/<environment>/tasks/<name>.sql`.

use anyhow::Result;
use std::io;

use crate::app::AppConfig;
use crate::cli::output::{print_progress, print_summary};
use crate::config::EnvironmentConfig;
use crate::deploy::{layout, with_session, Deployer};
use crate::error::DeployError;
use crate::session;

pub async fn run_task_command(
    environment: &str,
    task_name: &str,
    dry_run: bool,
    config: &AppConfig,
) -> Result<()> {
    let settings = EnvironmentConfig::load(config.config_dir(), environment).await?;

    let path = layout::task_file(config.scripts_dir(), environment, task_name);
    if !path.is_file() {
        return Err(DeployError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "task script not found"),
        )
        .into());
    }

    println!("🚀 Deploying task {} to {}", task_name, settings.name);
    if dry_run {
        println!("   Mode: dry run");
    }

    let provider = session::provider(dry_run);
    let placeholders = settings.placeholders();
    let mut result = with_session(provider.as_ref(), &settings, |session| async move {
        Deployer::new(session.as_ref(), placeholders)
            .on_progress(print_progress)
            .run_file(&path)
            .await
    })
    .await?;

    print_summary(&result, dry_run);
    match result.take_failure() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
