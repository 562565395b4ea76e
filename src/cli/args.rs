//! CLI argument structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_CONFIG_DIR, DEFAULT_SCRIPTS_DIR};

/// Deploy SQL scripts to a database environment
#[derive(Parser, Debug)]
#[command(name = "sqldeploy")]
#[command(about = "sqldeploy - Deploy SQL scripts to a database environment", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy every script category of an environment
    #[command(name = "deploy")]
    Deploy {
        /// Target environment (selects <config-dir>/<ENV>.yml)
        #[arg(short, long, value_name = "ENV")]
        environment: String,

        /// Category folder to deploy; repeat to set order (defaults to the configured order)
        #[arg(short, long = "category", value_name = "NAME")]
        categories: Vec<String>,

        #[command(flatten)]
        dirs: DirArgs,

        /// Scan and log statements without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Deploy a single task script from <scripts-dir>/<ENV>/tasks/
    #[command(name = "task")]
    Task {
        /// Target environment
        #[arg(short, long, value_name = "ENV")]
        environment: String,

        /// Task file name, with or without the .sql extension
        #[arg(short, long, value_name = "NAME")]
        task_name: String,

        #[command(flatten)]
        dirs: DirArgs,

        #[arg(long, help = "Scan and log statements without connecting")]
        dry_run: bool,
    },

    /// Show how a script file or directory splits into statements
    #[command(name = "scan")]
    Scan {
        /// A .sql file or a directory of .sql files
        path: PathBuf,

        /// Substitute this environment's placeholders before scanning
        #[arg(short, long, value_name = "ENV")]
        environment: Option<String>,

        #[arg(long, value_name = "DIR", default_value = DEFAULT_CONFIG_DIR)]
        config_dir: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DirArgs {
    /// Directory holding <ENV>.yml files
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Root of the <ENV>/<category>/*.sql script tree
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SCRIPTS_DIR)]
    pub scripts_dir: PathBuf,
}
