//! Script text processing
//!
//! Turns raw script text into the ordered statements that get submitted to
//! the database:
//! - `placeholder` - `{KEY}` substitution of environment-specific names
//! - `scanner` - statement splitting that respects blocks and `$$` bodies
//! - `statement` - the resulting statement units

pub mod placeholder;
pub mod scanner;
pub mod statement;

pub use placeholder::PlaceholderMap;
pub use scanner::{scan, OpenConstruct, ScanError};
pub use statement::StatementUnit;

/// Substitute placeholders, then split the result into statements
pub fn prepare(text: &str, placeholders: &PlaceholderMap) -> Result<Vec<StatementUnit>, ScanError> {
    scan(&placeholders.apply(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_substitutes_before_scanning() {
        let placeholders = PlaceholderMap::new()
            .with(placeholder::DATABASE_NAME, "PROD_DB")
            .with(placeholder::ROLE_NAME, "DEPLOYER");
        let units = prepare(
            "USE DATABASE {DATABASE_NAME};\nUSE ROLE {ROLE_NAME};\nSELECT '{NOT_A_KEY}';",
            &placeholders,
        )
        .unwrap();

        assert_eq!(units.len(), 3);
        assert_eq!(units[0].text, "USE DATABASE PROD_DB;");
        assert_eq!(units[1].text, "USE ROLE DEPLOYER;");
        assert_eq!(units[2].text, "SELECT '{NOT_A_KEY}';");
    }

    #[test]
    fn test_scanning_substituted_text_twice_is_identical() {
        let placeholders = PlaceholderMap::new().with(placeholder::DATABASE_NAME, "D");
        let text = placeholders.apply("USE DATABASE {DATABASE_NAME};\nBEGIN\n SELECT 1;\nEND;");
        assert_eq!(scan(&text).unwrap(), scan(&text).unwrap());
    }
}
