//! Access policy switches.
//!
//! # Environment Variables
//!
//! - `POLICY_STAFF_FLAG_IS_ADMIN`: treat the platform staff flag as the admin
//!   role (default: `true`)

use crate::parse_flag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyConfig {
    /// When set, an actor carrying the platform staff flag classifies as
    /// `Admin` regardless of its stored profile. Superusers always do.
    pub staff_flag_is_admin: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            staff_flag_is_admin: true,
        }
    }
}

impl PolicyConfig {
    /// Loads the config from the process environment, falling back to
    /// defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            staff_flag_is_admin: lookup("POLICY_STAFF_FLAG_IS_ADMIN")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.staff_flag_is_admin),
        }
    }
}
