/// Error code registry for sqldeploy
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Session errors
/// - 3000-3999: Storage errors
/// - 4000-4999: Execution errors
/// - 5000-5999: Script scanning errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_YAML: u16 = 1002;
    pub const CONFIG_MISSING_REQUIRED: u16 = 1004;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;

    // Session errors (2000-2999)
    pub const SESSION_ACQUISITION_FAILED: u16 = 2001;

    // Storage errors (3000-3999)
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_NOT_FOUND: u16 = 3004;

    // Execution errors (4000-4999)
    pub const EXEC_STATEMENT_FAILED: u16 = 4001;

    // Scan errors (5000-5999)
    pub const SCAN_UNTERMINATED_BLOCK: u16 = 5001;
    pub const SCAN_EMPTY_STATEMENT_SET: u16 = 5002;

    // Other errors (9000-9999)
    pub const OTHER_INTERRUPTED: u16 = 9001;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1001 => "Environment configuration file not found",
        1002 => "Invalid YAML syntax in environment configuration",
        1004 => "Required configuration field is missing",
        1005 => "Invalid value in configuration",

        2001 => "Could not acquire a database session",

        3001 => "Script file I/O error",
        3004 => "Script file or directory not found",

        4001 => "A statement was rejected by the database",

        5001 => "Script ends inside an open BEGIN block or $$ body",
        5002 => "Script contains text but no executable statements",

        9001 => "Run interrupted",

        _ => "Unknown error code",
    }
}
