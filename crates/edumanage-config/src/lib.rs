//! # EduManage Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`database`]: Postgres connection settings
//! - [`policy`]: access policy switches
//!
//! # Example
//!
//! ```ignore
//! use edumanage_config::{DatabaseConfig, PolicyConfig};
//!
//! let database = DatabaseConfig::from_env();
//! let policy = PolicyConfig::from_env();
//! ```

pub mod database;
pub mod policy;

pub use database::DatabaseConfig;
pub use policy::PolicyConfig;

/// Reads a flag the way operators tend to write them in `.env` files.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
