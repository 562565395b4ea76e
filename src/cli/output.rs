//! Progress and summary output for deployment commands

use crate::deploy::Progress;
use crate::executor::{BatchResult, FileStatus};

pub fn print_progress(event: Progress<'_>) {
    match event {
        Progress::Category { name, .. } => println!("\n📁 Category: {}", name),
        Progress::CategorySkipped { name, dir } => {
            println!("\n⚠️  Category {} skipped ({} not found)", name, dir.display())
        }
        Progress::File(path) => println!("📄 {}", path.display()),
        Progress::FileDone(summary) => match summary.status {
            FileStatus::Completed => println!(
                "   ✅ {} statements executed",
                summary.succeeded
            ),
            FileStatus::Empty => println!("   ⚪ no statements"),
            FileStatus::Failed => println!(
                "   ❌ failed after {}/{} statements",
                summary.succeeded, summary.statements
            ),
        },
    }
}

pub fn print_summary(result: &BatchResult, dry_run: bool) {
    println!();
    println!("📊 Summary: {}", result.summary());

    if let Some(failure) = result.statement_failure() {
        println!("❌ Stopped at statement {}", failure.locator());
        println!("   SQL: {}", failure.preview);
        println!("   Error: {}", failure.message);
    } else if let Some(error) = result.first_failure() {
        println!("❌ Stopped: {}", error.user_message());
    } else if dry_run {
        println!("🔍 Dry run complete, nothing was executed");
    } else {
        println!("🎉 Deployment completed successfully");
    }
}
