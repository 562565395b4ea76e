use clap::Parser;
use tracing::debug;

use sqldeploy::app::{handle_fatal_error, init_logging, AppConfig};
use sqldeploy::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    init_logging(&AppConfig::new(verbose));

    if let Err(e) = execute_command(cli.command, verbose).await {
        handle_fatal_error(e, verbose);
    }
    debug!("Command completed");
}
