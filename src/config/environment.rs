//! Per-environment settings
//!
//! Each target environment has a YAML file `<config_dir>/<environment>.yml`:
//!
//! ```yaml
//! database: PROD_DB
//! warehouse: DEPLOY_WH
//! role: DEPLOYER
//! schema: CORE                  # optional
//! statement_timeout: 10m        # optional, forwarded to the database
//! categories: [schemas, tables, stored_procedures, tasks, grants]  # optional
//! placeholders:                 # optional extra {KEY} values
//!   STAGE_NAME: PROD_STAGE
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DeployError, ErrorCode};
use crate::script::placeholder::{self, PlaceholderMap};

/// Category folders deployed when the environment does not list its own
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "schemas",
    "tables",
    "views",
    "stored_procedures",
    "tasks",
    "grants",
];

const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Environment name, taken from the file name
    #[serde(skip)]
    pub name: String,
    pub database: String,
    pub warehouse: String,
    pub role: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,
    #[serde(default, with = "humantime_serde")]
    pub statement_timeout: Option<Duration>,
}

impl EnvironmentConfig {
    pub fn new(
        database: impl Into<String>,
        warehouse: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: String::new(),
            database: database.into(),
            warehouse: warehouse.into(),
            role: role.into(),
            schema: None,
            categories: None,
            placeholders: BTreeMap::new(),
            statement_timeout: None,
        }
    }

    /// Load `<config_dir>/<environment>.yml` (or `.yaml`)
    pub async fn load(config_dir: &Path, environment: &str) -> Result<Self, DeployError> {
        validate_environment_name(environment)?;

        let path = find_config_file(config_dir, environment).ok_or_else(|| {
            DeployError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!(
                    "no configuration for environment '{}' in {}",
                    environment,
                    config_dir.display()
                ),
                Some(config_dir.join(format!("{}.yml", environment))),
            )
        })?;

        debug!("Loading environment configuration from {}", path.display());
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DeployError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                "cannot read configuration file",
                Some(path.clone()),
            )
            .with_source(e)
        })?;

        Self::from_yaml(environment, &content, Some(path))
    }

    /// Parse and validate settings from YAML text
    pub fn from_yaml(
        environment: &str,
        content: &str,
        path: Option<PathBuf>,
    ) -> Result<Self, DeployError> {
        let mut config: EnvironmentConfig = serde_yaml::from_str(content).map_err(|e| {
            let code = if e.to_string().contains("missing field") {
                ErrorCode::CONFIG_MISSING_REQUIRED
            } else {
                ErrorCode::CONFIG_INVALID_YAML
            };
            DeployError::config_with_code(code, e.to_string(), path.clone()).with_source(e)
        })?;
        config.name = environment.to_string();
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: Option<PathBuf>) -> Result<(), DeployError> {
        for (field, value) in [
            ("database", &self.database),
            ("warehouse", &self.warehouse),
            ("role", &self.role),
        ] {
            if value.trim().is_empty() {
                return Err(DeployError::config_with_code(
                    ErrorCode::CONFIG_MISSING_REQUIRED,
                    format!("'{}' must not be empty", field),
                    path,
                ));
            }
        }

        if let Some(categories) = &self.categories {
            if let Some(bad) = categories
                .iter()
                .find(|c| c.trim().is_empty() || c.contains(['/', '\\']) || c.as_str() == "..")
            {
                return Err(DeployError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("invalid category name '{}'", bad),
                    path,
                ));
            }
        }
        Ok(())
    }

    /// Placeholder values for this environment.
    ///
    /// `DATABASE_NAME`, `WAREHOUSE_NAME` and `ROLE_NAME` come from the
    /// settings above and take precedence over same-named entries in
    /// `placeholders`.
    pub fn placeholders(&self) -> PlaceholderMap {
        let mut map: PlaceholderMap = self
            .placeholders
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (key, value) in [
            (placeholder::DATABASE_NAME, &self.database),
            (placeholder::WAREHOUSE_NAME, &self.warehouse),
            (placeholder::ROLE_NAME, &self.role),
        ] {
            if let Some(previous) = map.insert(key, value.clone()) {
                if &previous != value {
                    warn!(
                        "Ignoring placeholders.{} = '{}'; using configured value '{}'",
                        key, previous, value
                    );
                }
            }
        }
        map
    }

    /// Category folders in deployment order
    pub fn category_order(&self) -> Vec<String> {
        match &self.categories {
            Some(categories) => categories.clone(),
            None => DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn validate_environment_name(environment: &str) -> Result<(), DeployError> {
    let valid = !environment.is_empty()
        && environment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DeployError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("invalid environment name '{}'", environment),
            None,
        ))
    }
}

fn find_config_file(config_dir: &Path, environment: &str) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("{}.{}", environment, ext)))
        .find(|path| path.is_file())
}
