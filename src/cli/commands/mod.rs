//! Command implementation modules

pub mod deploy;
pub mod scan;
pub mod task;

pub use deploy::{run_deploy_command, DeployParams};
pub use scan::run_scan_command;
pub use task::run_task_command;
