//! Actors and their role profiles.

use crate::ids::{ActorId, ExtensionId};
use crate::roles::{ExtensionKind, ProfileRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An authenticated identity.
///
/// `is_staff_flag` is the platform-level elevated flag and is distinct from
/// the "staff" role a profile may hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub is_superuser: bool,
    pub is_staff_flag: bool,
    pub profile: Option<RoleProfile>,
}

impl Actor {
    /// An actor with no elevated flags and no profile.
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            is_superuser: false,
            is_staff_flag: false,
            profile: None,
        }
    }

    pub fn superuser(id: ActorId) -> Self {
        Self {
            is_superuser: true,
            ..Self::new(id)
        }
    }

    pub fn with_profile(mut self, profile: RoleProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_staff_flag(mut self, is_staff_flag: bool) -> Self {
        self.is_staff_flag = is_staff_flag;
        self
    }
}

/// Binds an actor to exactly one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleProfile {
    pub actor_id: ActorId,
    pub role: ProfileRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role-specific row attached to an actor, e.g. the student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleExtension {
    pub id: ExtensionId,
    pub actor_id: ActorId,
    pub kind: ExtensionKind,
    /// Generated identifier such as `STU000123`.
    pub business_id: String,
    pub created_at: DateTime<Utc>,
}

/// Result of provisioning or switching a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedProfile {
    pub profile: RoleProfile,
    /// Extension for the profile's current role; `None` for admins.
    pub extension: Option<RoleExtension>,
    /// Whether this call created the profile or changed its role.
    pub changed: bool,
}

/// A profile together with every extension the actor has ever held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileHistory {
    pub profile: Option<RoleProfile>,
    pub extensions: Vec<RoleExtension>,
}
