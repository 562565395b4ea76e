//! Integration tests for the CLI interface

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A project with `config/dev.yml` and a `scripts/dev` tree
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config").join("dev.yml"),
        "database: DEV_DB\nwarehouse: DEV_WH\nrole: DEV_ROLE\n",
    )
    .unwrap();

    write_script(
        dir.path(),
        "tables/01_customers.sql",
        "USE DATABASE {DATABASE_NAME};\nCREATE TABLE customers (id INT);\n",
    );
    write_script(
        dir.path(),
        "tasks/nightly_load.sql",
        "CREATE OR REPLACE TASK nightly_load\n  WAREHOUSE = {WAREHOUSE_NAME}\nAS\nBEGIN\n  INSERT INTO t SELECT 1;\nEND;\n",
    );
    dir
}

fn write_script(root: &Path, relative: &str, content: &str) {
    let path = root.join("scripts").join("dev").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sqldeploy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sqldeploy").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("SNOWFLAKE_ACCOUNT")
        .env_remove("SNOWFLAKE_TOKEN")
        .env_remove("SNOWFLAKE_HOST");
    cmd
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::cargo_bin("sqldeploy").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("sqldeploy").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_deploy_dry_run() {
    let dir = project();
    sqldeploy(&dir)
        .args(["deploy", "--environment", "dev", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: tables"))
        .stdout(predicate::str::contains("Category schemas skipped"))
        .stdout(predicate::str::contains(
            "3 statements attempted, 3 succeeded, 0 failed across 2 files",
        ))
        .stdout(predicate::str::contains("Dry run complete"));
}

#[test]
fn test_deploy_selected_category() {
    let dir = project();
    sqldeploy(&dir)
        .args(["deploy", "-e", "dev", "-c", "tasks", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: tasks"))
        .stdout(predicate::str::contains("Category: tables").not())
        .stdout(predicate::str::contains("1 statements attempted"));
}

#[test]
fn test_deploy_unknown_environment() {
    let dir = project();
    sqldeploy(&dir)
        .args(["deploy", "--environment", "qa", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("[E1001]").or(predicate::str::contains("qa")));
}

#[test]
fn test_verbose_failure_describes_error_code() {
    let dir = project();
    sqldeploy(&dir)
        .args(["-v", "deploy", "--environment", "qa", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "[E1001] Environment configuration file not found",
        ));
}

#[test]
fn test_deploy_without_credentials() {
    let dir = project();
    sqldeploy(&dir)
        .args(["deploy", "--environment", "dev"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("SNOWFLAKE_TOKEN"));
}

#[test]
fn test_deploy_unterminated_block() {
    let dir = project();
    write_script(
        dir.path(),
        "tables/02_broken.sql",
        "CREATE PROCEDURE p() AS\nBEGIN\n  SELECT 1;\n",
    );

    sqldeploy(&dir)
        .args(["deploy", "--environment", "dev", "--dry-run"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("02_broken.sql"));
}

#[test]
fn test_task_dry_run() {
    let dir = project();
    sqldeploy(&dir)
        .args(["task", "-e", "dev", "--task-name", "nightly_load", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nightly_load.sql"))
        .stdout(predicate::str::contains("1 statements executed"));
}

#[test]
fn test_task_missing_script() {
    let dir = project();
    sqldeploy(&dir)
        .args(["task", "-e", "dev", "-t", "absent", "--dry-run"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("absent.sql"));
}

#[test]
fn test_scan_file_with_environment() {
    let dir = project();
    sqldeploy(&dir)
        .args(["scan", "scripts/dev/tasks/nightly_load.sql", "-e", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] line 1: TASK nightly_load"))
        .stdout(predicate::str::contains("WAREHOUSE = DEV_WH"))
        .stdout(predicate::str::contains("1 statements in 1 files"));
}

#[test]
fn test_scan_directory_reports_unresolved_placeholders() {
    let dir = project();
    sqldeploy(&dir)
        .args(["scan", "scripts/dev/tables"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 statements"))
        .stdout(predicate::str::contains("unresolved placeholders: DATABASE_NAME"));
}
