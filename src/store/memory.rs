use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use edumanage_models::{
    Actor, ActorId, Course, CourseId, Enrollment, EnrollmentId, ExtensionId, ExtensionKind,
    ProfileRole, ProvisionedProfile, RoleExtension, RoleProfile,
};
use tokio::sync::RwLock;

use super::{ProfileStore, RelationshipStore};
use crate::utils::errors::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy)]
struct ActorFlags {
    is_superuser: bool,
    is_staff_flag: bool,
}

#[derive(Debug, Default)]
struct State {
    actors: HashMap<ActorId, ActorFlags>,
    profiles: HashMap<ActorId, RoleProfile>,
    extensions: BTreeMap<ExtensionId, RoleExtension>,
    extension_index: HashMap<(ActorId, ExtensionKind), ExtensionId>,
    courses: HashMap<CourseId, Course>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
    last_business_number: i64,
}

impl State {
    /// Insert-if-absent for an extension; caller holds the write lock.
    fn get_or_create_extension(&mut self, actor: ActorId, kind: ExtensionKind) -> RoleExtension {
        if let Some(existing) = self
            .extension_index
            .get(&(actor, kind))
            .and_then(|id| self.extensions.get(id))
        {
            return existing.clone();
        }

        self.last_business_number += 1;
        let extension = RoleExtension {
            id: ExtensionId::new(),
            actor_id: actor,
            kind,
            business_id: kind.business_id(self.last_business_number),
            created_at: Utc::now(),
        };
        self.extension_index.insert((actor, kind), extension.id);
        self.extensions.insert(extension.id, extension.clone());
        extension
    }

    fn extension_for(&mut self, actor: ActorId, role: ProfileRole) -> Option<RoleExtension> {
        role.extension_kind()
            .map(|kind| self.get_or_create_extension(actor, kind))
    }
}

/// Numeric part of a business id; breaks `created_at` ties.
fn business_number(extension: &RoleExtension) -> u64 {
    extension
        .business_id
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(0)
}

/// Policy store kept entirely in memory.
///
/// One lock guards all tables, so every provisioning call is atomic with
/// respect to concurrent readers and writers.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    state: RwLock<State>,
}

impl InMemoryPolicyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account. Any profile on `actor` is stored as well.
    pub async fn register_actor(&self, actor: &Actor) {
        let mut state = self.state.write().await;
        state.actors.insert(
            actor.id,
            ActorFlags {
                is_superuser: actor.is_superuser,
                is_staff_flag: actor.is_staff_flag,
            },
        );
        if let Some(profile) = &actor.profile {
            state.profiles.insert(actor.id, profile.clone());
        }
    }

    pub async fn add_course(&self, title: &str, instructor: Option<ExtensionId>) -> CourseId {
        let course = Course {
            id: CourseId::new(),
            title: title.to_string(),
            instructor_id: instructor,
            created_at: Utc::now(),
        };
        let id = course.id;
        self.state.write().await.courses.insert(id, course);
        id
    }

    pub async fn enroll(
        &self,
        student: ExtensionId,
        course: CourseId,
        is_active: bool,
    ) -> EnrollmentId {
        let enrollment = Enrollment {
            id: EnrollmentId::new(),
            student_id: student,
            course_id: course,
            is_active,
            enrolled_at: Utc::now(),
        };
        let id = enrollment.id;
        self.state.write().await.enrollments.insert(id, enrollment);
        id
    }

    /// Returns `false` if the enrollment does not exist.
    pub async fn set_enrollment_active(&self, enrollment: EnrollmentId, is_active: bool) -> bool {
        match self.state.write().await.enrollments.get_mut(&enrollment) {
            Some(row) => {
                row.is_active = is_active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RelationshipStore for InMemoryPolicyStore {
    async fn find_extension(
        &self,
        actor: ActorId,
        kind: ExtensionKind,
    ) -> StoreResult<Option<RoleExtension>> {
        let state = self.state.read().await;
        Ok(state
            .extension_index
            .get(&(actor, kind))
            .and_then(|id| state.extensions.get(id))
            .cloned())
    }

    async fn courses_taught_by(&self, teacher: ExtensionId) -> StoreResult<Vec<CourseId>> {
        let state = self.state.read().await;
        let mut courses: Vec<CourseId> = state
            .courses
            .values()
            .filter(|course| course.instructor_id == Some(teacher))
            .map(|course| course.id)
            .collect();
        courses.sort();
        Ok(courses)
    }

    async fn active_enrollments_in(&self, courses: &[CourseId]) -> StoreResult<Vec<Enrollment>> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .filter(|row| row.is_active && courses.contains(&row.course_id))
            .cloned()
            .collect())
    }

    async fn active_enrollments_of(&self, student: ExtensionId) -> StoreResult<Vec<Enrollment>> {
        let state = self.state.read().await;
        Ok(state
            .enrollments
            .values()
            .filter(|row| row.is_active && row.student_id == student)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileStore for InMemoryPolicyStore {
    async fn find_actor(&self, actor: ActorId) -> StoreResult<Option<Actor>> {
        let state = self.state.read().await;
        Ok(state.actors.get(&actor).map(|flags| Actor {
            id: actor,
            is_superuser: flags.is_superuser,
            is_staff_flag: flags.is_staff_flag,
            profile: state.profiles.get(&actor).cloned(),
        }))
    }

    async fn find_profile(&self, actor: ActorId) -> StoreResult<Option<RoleProfile>> {
        Ok(self.state.read().await.profiles.get(&actor).cloned())
    }

    async fn find_extension_by_id(&self, id: ExtensionId) -> StoreResult<Option<RoleExtension>> {
        Ok(self.state.read().await.extensions.get(&id).cloned())
    }

    async fn list_extensions(&self, actor: ActorId) -> StoreResult<Vec<RoleExtension>> {
        let state = self.state.read().await;
        let mut extensions: Vec<RoleExtension> = state
            .extensions
            .values()
            .filter(|ext| ext.actor_id == actor)
            .cloned()
            .collect();
        extensions.sort_by_key(|ext| (ext.created_at, business_number(ext)));
        Ok(extensions)
    }

    async fn provision(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> StoreResult<ProvisionedProfile> {
        let mut state = self.state.write().await;
        if !state.actors.contains_key(&actor) {
            return Err(StoreError::UnknownActor(actor));
        }

        let existing = state.profiles.get(&actor).cloned();
        let (profile, changed) = match existing {
            Some(existing) => (existing, false),
            None => {
                let now = Utc::now();
                let profile = RoleProfile {
                    actor_id: actor,
                    role,
                    created_at: now,
                    updated_at: now,
                };
                state.profiles.insert(actor, profile.clone());
                (profile, true)
            }
        };

        if profile.role != role {
            return Ok(ProvisionedProfile {
                profile,
                extension: None,
                changed: false,
            });
        }

        let extension = state.extension_for(actor, role);
        Ok(ProvisionedProfile {
            profile,
            extension,
            changed,
        })
    }

    async fn switch_role(
        &self,
        actor: ActorId,
        role: ProfileRole,
    ) -> StoreResult<Option<ProvisionedProfile>> {
        let mut state = self.state.write().await;
        let Some(profile) = state.profiles.get_mut(&actor) else {
            return Ok(None);
        };

        let changed = profile.role != role;
        if changed {
            profile.role = role;
            profile.updated_at = Utc::now();
        }
        let profile = profile.clone();

        let extension = state.extension_for(actor, role);
        Ok(Some(ProvisionedProfile {
            profile,
            extension,
            changed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_provision_unknown_actor_fails() {
        let store = InMemoryPolicyStore::new();
        let err = store
            .provision(ActorId::new(), ProfileRole::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownActor(_)));
    }

    #[tokio::test]
    async fn test_business_ids_are_sequential() {
        let store = InMemoryPolicyStore::new();
        let first = Actor::new(ActorId::new());
        let second = Actor::new(ActorId::new());
        store.register_actor(&first).await;
        store.register_actor(&second).await;

        let a = store.provision(first.id, ProfileRole::Student).await.unwrap();
        let b = store.provision(second.id, ProfileRole::Teacher).await.unwrap();

        assert_eq!(a.extension.unwrap().business_id, "STU000001");
        assert_eq!(b.extension.unwrap().business_id, "TCH000002");
    }

    #[tokio::test]
    async fn test_inactive_enrollments_are_filtered() {
        let store = InMemoryPolicyStore::new();
        let course = store.add_course("Algebra", None).await;
        let active = ExtensionId::new();
        let dropped = ExtensionId::new();
        store.enroll(active, course, true).await;
        let dropped_row = store.enroll(dropped, course, true).await;
        assert!(store.set_enrollment_active(dropped_row, false).await);

        let rows = store.active_enrollments_in(&[course]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, active);
        assert!(store.active_enrollments_of(dropped).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switch_role_without_profile_returns_none() {
        let store = InMemoryPolicyStore::new();
        let actor = Actor::new(ActorId::new());
        store.register_actor(&actor).await;

        let outcome = store.switch_role(actor.id, ProfileRole::Teacher).await.unwrap();
        assert!(outcome.is_none());
    }
}
