//! Storage ports consumed by the policy engine.
//!
//! The engine never owns storage. It reads relationship edges through
//! [`RelationshipStore`] and performs the only writes in scope, profile
//! provisioning and role switches, through [`ProfileStore`]. Both have a
//! Postgres implementation ([`PgPolicyStore`]) and an in-memory one
//! ([`InMemoryPolicyStore`]) used by tests and tooling.

use async_trait::async_trait;
use edumanage_models::{
    Actor, ActorId, CourseId, Enrollment, ExtensionId, ExtensionKind, ProfileRole,
    ProvisionedProfile, RoleExtension, RoleProfile,
};

use crate::utils::errors::StoreResult;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPolicyStore;
pub use postgres::{PgPolicyStore, push_scope};

/// Read-only access to the edges the relationship resolver traverses.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Finds the actor's extension of the given kind, if provisioned.
    async fn find_extension(
        &self,
        actor: ActorId,
        kind: ExtensionKind,
    ) -> StoreResult<Option<RoleExtension>>;

    /// Courses whose instructor is the given teacher extension.
    async fn courses_taught_by(&self, teacher: ExtensionId) -> StoreResult<Vec<CourseId>>;

    /// Active enrollments in any of the given courses.
    async fn active_enrollments_in(&self, courses: &[CourseId]) -> StoreResult<Vec<Enrollment>>;

    /// Active enrollments held by the given student extension.
    async fn active_enrollments_of(&self, student: ExtensionId) -> StoreResult<Vec<Enrollment>>;
}

/// Profile and extension persistence.
///
/// `provision` and `switch_role` must each run as one atomic unit: the
/// profile write and the extension write both land or neither does, and
/// extension creation is an insert-if-absent so concurrent callers converge on
/// a single row.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Loads an actor with its elevated flags and profile.
    async fn find_actor(&self, actor: ActorId) -> StoreResult<Option<Actor>>;

    async fn find_profile(&self, actor: ActorId) -> StoreResult<Option<RoleProfile>>;

    async fn find_extension_by_id(&self, id: ExtensionId) -> StoreResult<Option<RoleExtension>>;

    /// Every extension the actor holds, oldest first.
    async fn list_extensions(&self, actor: ActorId) -> StoreResult<Vec<RoleExtension>>;

    /// Creates the profile with `role` if the actor has none, then gets or
    /// creates the matching extension.
    ///
    /// If a profile with a different role already exists nothing is written
    /// and the existing profile is returned with `extension: None`.
    async fn provision(&self, actor: ActorId, role: ProfileRole)
    -> StoreResult<ProvisionedProfile>;

    /// Sets the role of an existing profile and gets or creates the matching
    /// extension. Extensions of earlier roles are kept.
    ///
    /// Returns `None` when the actor has no profile.
    async fn switch_role(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> StoreResult<Option<ProvisionedProfile>>;
}
