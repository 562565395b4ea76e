//! Scan command implementation
//!
//! Prints the statements a script splits into without connecting anywhere.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::app::AppConfig;
use crate::config::EnvironmentConfig;
use crate::deploy::layout;
use crate::error::DeployError;
use crate::script::{prepare, PlaceholderMap};

pub async fn run_scan_command(
    path: &Path,
    environment: Option<&str>,
    config: &AppConfig,
) -> Result<()> {
    let placeholders = match environment {
        Some(env) => EnvironmentConfig::load(config.config_dir(), env)
            .await?
            .placeholders(),
        None => PlaceholderMap::new(),
    };

    let files: Vec<PathBuf> = if path.is_dir() {
        layout::sql_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut total = 0;
    for file in &files {
        total += scan_file(file, &placeholders).await?;
    }

    println!();
    println!("📊 {} statements in {} files", total, files.len());
    Ok(())
}

async fn scan_file(path: &Path, placeholders: &PlaceholderMap) -> Result<usize, DeployError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DeployError::io(path, e))?;
    let units = prepare(&text, placeholders).map_err(|e| DeployError::scan(Some(path), e))?;

    println!("📄 {} ({} statements)", path.display(), units.len());
    for unit in &units {
        println!("   [{}] line {}: {}", unit.index, unit.line, unit.label());
        println!("       {}", unit.preview());
    }

    let unresolved = placeholders.unresolved(&placeholders.apply(&text));
    if !unresolved.is_empty() {
        println!("   ⚠️  unresolved placeholders: {}", unresolved.join(", "));
    }
    Ok(units.len())
}
