//! Role enums.
//!
//! [`ProfileRole`] is what a role profile stores. [`Role`] is what the
//! classifier hands to the policy engine: every stored role plus
//! [`Role::Unclassified`] for actors with no profile yet.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;

/// A role name that does not map to any [`ProfileRole`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// Role stored on an actor's role profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Student,
    Teacher,
    Staff,
    Admin,
}

impl ProfileRole {
    pub const ALL: [ProfileRole; 4] = [Self::Student, Self::Teacher, Self::Staff, Self::Admin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }

    /// Extension row that must exist for an actor holding this role.
    ///
    /// Admins have none; they rely on elevated flags instead.
    pub const fn extension_kind(self) -> Option<ExtensionKind> {
        match self {
            Self::Student => Some(ExtensionKind::Student),
            Self::Teacher => Some(ExtensionKind::Teacher),
            Self::Staff => Some(ExtensionKind::Staff),
            Self::Admin => None,
        }
    }
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "staff" => Ok(Self::Staff),
            "admin" | "administrator" => Ok(Self::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Canonical role of an actor as seen by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Staff,
    Admin,
    /// No profile and no elevated flags. Denied everything.
    Unclassified,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Self::Student,
        Self::Teacher,
        Self::Staff,
        Self::Admin,
        Self::Unclassified,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
            Self::Admin => "admin",
            Self::Unclassified => "unclassified",
        }
    }
}

impl From<ProfileRole> for Role {
    fn from(role: ProfileRole) -> Self {
        match role {
            ProfileRole::Student => Role::Student,
            ProfileRole::Teacher => Role::Teacher,
            ProfileRole::Staff => Role::Staff,
            ProfileRole::Admin => Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of role-specific extension row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    Student,
    Teacher,
    Staff,
}

impl ExtensionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
        }
    }

    /// Prefix of generated business ids, e.g. `STU000123`.
    pub const fn business_prefix(self) -> &'static str {
        match self {
            Self::Student => "STU",
            Self::Teacher => "TCH",
            Self::Staff => "STF",
        }
    }

    /// Formats a business id from a sequence number.
    pub fn business_id(self, number: i64) -> String {
        format!("{}{:06}", self.business_prefix(), number)
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionKind {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "staff" => Ok(Self::Staff),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Stores a string-backed enum in a Postgres `TEXT` column.
macro_rules! text_column {
    ($name:ident) => {
        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<$name>()?)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }
    };
}

text_column!(ProfileRole);
text_column!(ExtensionKind);
