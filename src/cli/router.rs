//! Command routing and execution

use anyhow::Result;

use crate::app::AppConfig;
use crate::cli::args::{Commands, DirArgs};
use crate::cli::commands::*;

fn app_config(dirs: DirArgs, verbose: u8) -> AppConfig {
    AppConfig::new(verbose)
        .with_config_dir(dirs.config_dir)
        .with_scripts_dir(dirs.scripts_dir)
}

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, verbose: u8) -> Result<()> {
    match command {
        Commands::Deploy {
            environment,
            categories,
            dirs,
            dry_run,
        } => {
            let config = app_config(dirs, verbose);
            run_deploy_command(
                DeployParams {
                    environment,
                    categories,
                    dry_run,
                },
                &config,
            )
            .await
        }
        Commands::Task {
            environment,
            task_name,
            dirs,
            dry_run,
        } => {
            let config = app_config(dirs, verbose);
            run_task_command(&environment, &task_name, dry_run, &config).await
        }
        Commands::Scan {
            path,
            environment,
            config_dir,
        } => {
            let config = AppConfig::new(verbose).with_config_dir(config_dir);
            run_scan_command(&path, environment.as_deref(), &config).await
        }
    }
}
