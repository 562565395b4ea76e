use std::path::Path;
use tracing::{debug, error, info, warn};

use super::layout;
use crate::error::DeployError;
use crate::executor::{BatchResult, FileStatus, FileSummary, StatementExecutor};
use crate::script::{scan, PlaceholderMap};
use crate::session::SqlSession;

/// Progress notifications for live output
#[derive(Debug, Clone, Copy)]
pub enum Progress<'p> {
    Category { name: &'p str, dir: &'p Path },
    CategorySkipped { name: &'p str, dir: &'p Path },
    File(&'p Path),
    FileDone(&'p FileSummary),
}

type ProgressFn<'a> = Box<dyn Fn(Progress<'_>) + Send + Sync + 'a>;

/// Runs scripts, files, directories and category trees against one session.
///
/// Every level is fail-fast: the first scan error or rejected statement
/// stops the remaining statements, files and categories.
pub struct Deployer<'a> {
    session: &'a dyn SqlSession,
    placeholders: PlaceholderMap,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> Deployer<'a> {
    pub fn new(session: &'a dyn SqlSession, placeholders: PlaceholderMap) -> Self {
        Self {
            session,
            placeholders,
            progress: None,
        }
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress<'_>) + Send + Sync + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    fn notify(&self, event: Progress<'_>) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    /// Substitute, scan and execute one script's text
    pub async fn run_script(&self, source: &Path, text: &str) -> BatchResult {
        let text = self.placeholders.apply(text);
        let unresolved = self.placeholders.unresolved(&text);
        if !unresolved.is_empty() {
            debug!(
                "{} references unknown placeholders: {}",
                source.display(),
                unresolved.join(", ")
            );
        }

        let units = match scan(&text) {
            Ok(units) => units,
            Err(e) => {
                error!("Cannot split {}: {}", source.display(), e);
                let mut result = BatchResult::failed(DeployError::scan(Some(source), e));
                self.push_summary(&mut result, source, 0);
                return result;
            }
        };
        debug!("{} contains {} statements", source.display(), units.len());

        let mut result = StatementExecutor::new(self.session)
            .with_source(source)
            .execute(&units)
            .await;
        self.push_summary(&mut result, source, units.len());
        result
    }

    fn push_summary(&self, result: &mut BatchResult, path: &Path, statements: usize) {
        let status = if !result.is_success() {
            FileStatus::Failed
        } else if statements == 0 {
            FileStatus::Empty
        } else {
            FileStatus::Completed
        };
        let summary = FileSummary {
            path: path.to_path_buf(),
            statements,
            succeeded: result.succeeded(),
            status,
        };
        self.notify(Progress::FileDone(&summary));
        result.files.push(summary);
    }

    /// Read and run one script file
    pub async fn run_file(&self, path: &Path) -> BatchResult {
        info!("Deploying {}", path.display());
        self.notify(Progress::File(path));

        match tokio::fs::read_to_string(path).await {
            Ok(text) => self.run_script(path, &text).await,
            Err(e) => {
                error!("Cannot read {}: {}", path.display(), e);
                let mut result = BatchResult::failed(DeployError::io(path, e));
                self.push_summary(&mut result, path, 0);
                result
            }
        }
    }

    /// Run every `.sql` file directly inside `dir`, in lexical order
    pub async fn run_directory(&self, dir: &Path) -> BatchResult {
        let files = match layout::sql_files(dir) {
            Ok(files) => files,
            Err(e) => return BatchResult::failed(e),
        };
        if files.is_empty() {
            info!("No scripts in {}", dir.display());
        }

        let mut total = BatchResult::new();
        for file in files {
            total.absorb(self.run_file(&file).await);
            if !total.is_success() {
                warn!("Stopping {} after failure in {}", dir.display(), file.display());
                break;
            }
        }
        total
    }

    /// Run category folders under `root` in the given order.
    ///
    /// Missing folders are skipped with a warning.
    pub async fn run_categories<S: AsRef<str>>(&self, root: &Path, categories: &[S]) -> BatchResult {
        let mut total = BatchResult::new();
        for category in categories {
            let name = category.as_ref();
            let dir = root.join(name);
            if !dir.is_dir() {
                warn!("Category folder {} not found, skipping", dir.display());
                self.notify(Progress::CategorySkipped { name, dir: &dir });
                continue;
            }

            info!("Deploying category {}", name);
            self.notify(Progress::Category { name, dir: &dir });
            total.absorb(self.run_directory(&dir).await);
            if !total.is_success() {
                break;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSession;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn placeholders() -> PlaceholderMap {
        PlaceholderMap::new().with("DATABASE_NAME", "DEV_DB")
    }

    #[tokio::test]
    async fn test_run_script_substitutes_placeholders() {
        let session = MockSession::new();
        let deployer = Deployer::new(&session, placeholders());

        let result = deployer
            .run_script(
                Path::new("inline.sql"),
                "USE DATABASE {DATABASE_NAME};\nCREATE SCHEMA {SCHEMA};",
            )
            .await;

        assert!(result.is_success());
        assert_eq!(
            session.submitted(),
            vec!["USE DATABASE DEV_DB;", "CREATE SCHEMA {SCHEMA};"]
        );
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].status, FileStatus::Completed);
        assert_eq!(result.files[0].statements, 2);
    }

    #[tokio::test]
    async fn test_run_script_scan_error_submits_nothing() {
        let session = MockSession::new();
        let deployer = Deployer::new(&session, placeholders());

        let result = deployer
            .run_script(
                Path::new("broken.sql"),
                "SELECT 1;\nCREATE PROCEDURE p() AS BEGIN\n  SELECT 2;\n",
            )
            .await;

        assert!(session.submitted().is_empty());
        assert_eq!(result.attempted(), 0);
        assert_eq!(result.files[0].status, FileStatus::Failed);
        match result.first_failure() {
            Some(DeployError::Scan { path, .. }) => {
                assert_eq!(path.as_deref(), Some(Path::new("broken.sql")))
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_script_comment_only_is_empty() {
        let session = MockSession::new();
        let deployer = Deployer::new(&session, placeholders());

        let result = deployer
            .run_script(Path::new("notes.sql"), "-- nothing yet\n\n")
            .await;

        assert!(result.is_success());
        assert_eq!(result.files[0].status, FileStatus::Empty);
    }

    #[tokio::test]
    async fn test_run_file_missing() {
        let dir = TempDir::new().unwrap();
        let session = MockSession::new();
        let deployer = Deployer::new(&session, placeholders());

        let result = deployer.run_file(&dir.path().join("absent.sql")).await;
        assert!(matches!(result.first_failure(), Some(DeployError::Io { .. })));
    }

    #[tokio::test]
    async fn test_run_directory_lexical_order_and_fail_fast() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("02_b.sql"), "SELECT 'b1';\nSELECT 'b2';").unwrap();
        fs::write(dir.path().join("01_a.sql"), "SELECT 'a';").unwrap();
        fs::write(dir.path().join("03_c.sql"), "SELECT 'c';").unwrap();

        let session = MockSession::new();
        session.fail_on_text("'b2'", "boom");
        let deployer = Deployer::new(&session, placeholders());

        let result = deployer.run_directory(dir.path()).await;

        assert_eq!(
            session.submitted(),
            vec!["SELECT 'a';", "SELECT 'b1';", "SELECT 'b2';"]
        );
        assert_eq!(result.attempted(), 3);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.files.len(), 2);
        let failure = result.statement_failure().unwrap();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.source, Some(dir.path().join("02_b.sql")));
    }

    #[tokio::test]
    async fn test_run_categories_skips_missing_and_keeps_order() {
        let root = TempDir::new().unwrap();
        for (category, sql) in [
            ("tasks", "CREATE TASK t AS SELECT 1;"),
            ("tables", "CREATE TABLE x (id INT);"),
        ] {
            fs::create_dir(root.path().join(category)).unwrap();
            fs::write(root.path().join(category).join("a.sql"), sql).unwrap();
        }

        let session = MockSession::new();
        let seen = Mutex::new(Vec::new());
        let deployer = Deployer::new(&session, placeholders()).on_progress(|event| {
            let line = match event {
                Progress::Category { name, .. } => format!("category {}", name),
                Progress::CategorySkipped { name, .. } => format!("skipped {}", name),
                Progress::File(path) => format!("file {}", path.file_name().unwrap().to_string_lossy()),
                Progress::FileDone(summary) => format!("done {:?}", summary.status),
            };
            seen.lock().unwrap().push(line);
        });

        let result = deployer
            .run_categories(root.path(), &["schemas", "tables", "tasks"])
            .await;

        assert!(result.is_success());
        assert_eq!(
            session.submitted(),
            vec!["CREATE TABLE x (id INT);", "CREATE TASK t AS SELECT 1;"]
        );
        drop(deployer);
        assert_eq!(
            seen.into_inner().unwrap(),
            vec![
                "skipped schemas",
                "category tables",
                "file a.sql",
                "done Completed",
                "category tasks",
                "file a.sql",
                "done Completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_categories_stops_after_failing_category() {
        let root = TempDir::new().unwrap();
        for category in ["schemas", "tables"] {
            fs::create_dir(root.path().join(category)).unwrap();
            fs::write(
                root.path().join(category).join("a.sql"),
                format!("SELECT '{}';", category),
            )
            .unwrap();
        }

        let session = MockSession::new();
        session.fail_on_call(1, "denied");
        let deployer = Deployer::new(&session, placeholders());

        let result = deployer
            .run_categories(root.path(), &["schemas".to_string(), "tables".to_string()])
            .await;

        assert_eq!(session.submitted(), vec!["SELECT 'schemas';"]);
        assert_eq!(
            result.statement_failure().map(|f| f.source.clone()),
            Some(Some(PathBuf::from(root.path().join("schemas").join("a.sql"))))
        );
    }
}
