//! Script directory layout
//!
//! ```text
//! <scripts_dir>/<environment>/<category>/*.sql
//! ```

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::DeployError;

pub const SCRIPT_EXTENSION: &str = "sql";
pub const TASKS_CATEGORY: &str = "tasks";

pub fn environment_dir(scripts_dir: &Path, environment: &str) -> PathBuf {
    scripts_dir.join(environment)
}

/// `<scripts_dir>/<environment>/tasks/<task_name>.sql`
pub fn task_file(scripts_dir: &Path, environment: &str, task_name: &str) -> PathBuf {
    let file_name = if is_sql_file(Path::new(task_name)) {
        task_name.to_string()
    } else {
        format!("{}.{}", task_name, SCRIPT_EXTENSION)
    };
    environment_dir(scripts_dir, environment)
        .join(TASKS_CATEGORY)
        .join(file_name)
}

pub fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

/// `.sql` files directly inside `dir`, in lexical file name order
pub fn sql_files(dir: &Path) -> Result<Vec<PathBuf>, DeployError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("directory loop detected"));
            DeployError::io(path, source)
        })?;
        if entry.file_type().is_file() && is_sql_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
