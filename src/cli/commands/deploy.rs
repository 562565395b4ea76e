//! Deploy command implementation
//!
//! Runs every category folder of `<scripts_dir>/<environment>` on one
//! session, in the configured order.

use anyhow::Result;
use std::io;
use tracing::debug;

use crate::app::AppConfig;
use crate::cli::output::{print_progress, print_summary};
use crate::config::EnvironmentConfig;
use crate::deploy::{layout, with_session, Deployer};
use crate::error::DeployError;
use crate::session;

#[derive(Debug, Clone)]
pub struct DeployParams {
    pub environment: String,
    /// Overrides the configured category order when non-empty
    pub categories: Vec<String>,
    pub dry_run: bool,
}

pub async fn run_deploy_command(params: DeployParams, config: &AppConfig) -> Result<()> {
    let settings = EnvironmentConfig::load(config.config_dir(), &params.environment).await?;

    let root = layout::environment_dir(config.scripts_dir(), &params.environment);
    if !root.is_dir() {
        return Err(DeployError::io(
            root,
            io::Error::new(io::ErrorKind::NotFound, "scripts directory not found"),
        )
        .into());
    }

    let categories = if params.categories.is_empty() {
        settings.category_order()
    } else {
        params.categories
    };
    debug!("Category order: {:?}", categories);

    println!("🚀 Deploying environment: {}", settings.name);
    println!("   Database: {}", settings.database);
    println!("   Warehouse: {}", settings.warehouse);
    println!("   Role: {}", settings.role);
    if params.dry_run {
        println!("   Mode: dry run");
    }

    let provider = session::provider(params.dry_run);
    let placeholders = settings.placeholders();
    let mut result = with_session(provider.as_ref(), &settings, |session| async move {
        Deployer::new(session.as_ref(), placeholders)
            .on_progress(print_progress)
            .run_categories(&root, &categories)
            .await
    })
    .await?;

    print_summary(&result, params.dry_run);
    match result.take_failure() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
