//! Courses and enrollments: the edges the relationship resolver traverses.

use crate::ids::{CourseId, EnrollmentId, ExtensionId, ResourceId};
use crate::resources::{Resource, ResourceClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A course offering. `instructor_id` is the teaching edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub instructor_id: Option<ExtensionId>,
    pub created_at: DateTime<Utc>,
}

/// A student's enrollment in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: ExtensionId,
    pub course_id: CourseId,
    pub is_active: bool,
    pub enrolled_at: DateTime<Utc>,
}

impl Resource for Course {
    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Course
    }

    fn resource_id(&self) -> ResourceId {
        self.id.into()
    }

    fn owner_field(&self, _field: &str) -> Option<ResourceId> {
        None
    }
}

impl Resource for Enrollment {
    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Enrollment
    }

    fn resource_id(&self) -> ResourceId {
        self.id.into()
    }

    fn owner_field(&self, field: &str) -> Option<ResourceId> {
        match field {
            "student_id" => Some(self.student_id.into()),
            _ => None,
        }
    }
}
