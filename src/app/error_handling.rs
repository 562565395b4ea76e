//! Error handling utilities

use tracing::error;

use crate::error::{describe_error_code, DeployError};

/// Exit code for an error that reached the top of a command
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<DeployError>()
        .map(DeployError::exit_code)
        .unwrap_or(1)
}

/// Report a fatal error and exit with its status code
///
/// - `verbose = 0`: user-facing message only
/// - `verbose >= 1`: adds the error code description and the error chain
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    if let Some(deploy_err) = error.downcast_ref::<DeployError>() {
        eprintln!("❌ {}", deploy_err.user_message());
        if verbose >= 1 {
            let code = deploy_err.code();
            eprintln!("\n[E{:04}] {}", code, describe_error_code(code));
            eprintln!("\nContext Chain:\n{}", deploy_err.developer_message());
        }
    } else {
        eprintln!("❌ Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
    }

    std::process::exit(exit_code_for(&error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScanError;

    #[test]
    fn test_exit_code_for_deploy_errors() {
        let err: anyhow::Error = DeployError::scan(None, ScanError::EmptyStatementSet).into();
        assert_eq!(exit_code_for(&err), 6);

        let err: anyhow::Error = DeployError::Interrupted.into();
        assert_eq!(exit_code_for(&err), 130);
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
