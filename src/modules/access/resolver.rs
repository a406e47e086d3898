use std::collections::BTreeSet;
use std::sync::Arc;

use edumanage_models::{
    ActorId, CourseId, ExtensionKind, OwnerRef, ResourceClass, ResourceId, Role,
};
use tracing::{debug, instrument};

use super::predicate::RelatedIds;
use crate::store::RelationshipStore;
use crate::utils::errors::StoreError;

/// Computes the set of records an actor is related to for a resource class.
///
/// Relations that traverse courses and enrollments are read from the
/// [`RelationshipStore`]; every other owned class resolves to the actor's
/// own identity, keyed by the class's ownership fields.
#[derive(Clone)]
pub struct RelationshipResolver {
    store: Arc<dyn RelationshipStore>,
}

impl RelationshipResolver {
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn related_ids(
        &self,
        actor: ActorId,
        role: Role,
        class: ResourceClass,
    ) -> Result<RelatedIds, StoreError> {
        match (role, class) {
            (Role::Unclassified, _) => Ok(RelatedIds::none()),
            (Role::Teacher, ResourceClass::Student) => self.students_taught(actor).await,
            (Role::Teacher, ResourceClass::Course) => self.courses_taught(actor).await,
            (Role::Teacher, ResourceClass::Enrollment) => self.enrollments_taught(actor).await,
            (Role::Student, ResourceClass::Course) => self.courses_attended(actor).await,
            (_, class) if class.has_owner() => self.owned_ids(actor, class).await,
            _ => Ok(RelatedIds::none()),
        }
    }

    /// The value the class's ownership columns hold for records `actor` owns.
    ///
    /// Extension-keyed classes resolve through the actor's extension of the
    /// referenced kind; without that extension the actor owns nothing there.
    #[instrument(skip(self))]
    pub async fn owned_ids(
        &self,
        actor: ActorId,
        class: ResourceClass,
    ) -> Result<RelatedIds, StoreError> {
        match class.owner_ref() {
            None => Ok(RelatedIds::none()),
            Some(OwnerRef::Actor) => Ok(RelatedIds::owned_by(class, actor)),
            Some(OwnerRef::Extension(kind)) => {
                match self.store.find_extension(actor, kind).await? {
                    Some(extension) => Ok(RelatedIds::owned_by(class, extension.id)),
                    None => {
                        debug!(%actor, %kind, %class, "no extension to own records through");
                        Ok(RelatedIds::none())
                    }
                }
            }
        }
    }

    async fn taught_courses(&self, actor: ActorId) -> Result<Option<Vec<CourseId>>, StoreError> {
        let Some(teacher) = self
            .store
            .find_extension(actor, ExtensionKind::Teacher)
            .await?
        else {
            debug!(%actor, "teacher has no teacher extension");
            return Ok(None);
        };
        Ok(Some(self.store.courses_taught_by(teacher.id).await?))
    }

    async fn students_taught(&self, actor: ActorId) -> Result<RelatedIds, StoreError> {
        let Some(courses) = self.taught_courses(actor).await? else {
            return Ok(RelatedIds::none());
        };
        if courses.is_empty() {
            return Ok(RelatedIds::none());
        }
        let students: BTreeSet<ResourceId> = self
            .store
            .active_enrollments_in(&courses)
            .await?
            .into_iter()
            .map(|row| ResourceId::from(row.student_id))
            .collect();
        Ok(RelatedIds::by_id(students))
    }

    async fn courses_taught(&self, actor: ActorId) -> Result<RelatedIds, StoreError> {
        let courses = self.taught_courses(actor).await?.unwrap_or_default();
        Ok(RelatedIds::by_id(courses.into_iter().map(ResourceId::from)))
    }

    async fn enrollments_taught(&self, actor: ActorId) -> Result<RelatedIds, StoreError> {
        let courses = self.taught_courses(actor).await?.unwrap_or_default();
        if courses.is_empty() {
            return Ok(RelatedIds::none());
        }
        let rows = self.store.active_enrollments_in(&courses).await?;
        Ok(RelatedIds::by_id(rows.into_iter().map(|row| ResourceId::from(row.id))))
    }

    async fn courses_attended(&self, actor: ActorId) -> Result<RelatedIds, StoreError> {
        let Some(student) = self
            .store
            .find_extension(actor, ExtensionKind::Student)
            .await?
        else {
            debug!(%actor, "student has no student extension");
            return Ok(RelatedIds::none());
        };
        let rows = self.store.active_enrollments_of(student.id).await?;
        Ok(RelatedIds::by_id(
            rows.into_iter().map(|row| ResourceId::from(row.course_id)),
        ))
    }
}

impl std::fmt::Debug for RelationshipResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipResolver").finish_non_exhaustive()
    }
}
