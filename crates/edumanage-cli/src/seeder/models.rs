//! Seed data shapes and seeding configuration.

use edumanage_models::{ActorId, CourseId, ExtensionId, ProfileRole};

/// An account to insert before its profile is provisioned.
pub struct ActorSeed {
    pub id: ActorId,
    pub email: String,
    pub role: ProfileRole,
}

pub struct CourseSeed {
    pub id: CourseId,
    pub title: String,
    pub instructor_id: ExtensionId,
}

/// Configuration for a demo school.
#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub teachers: usize,
    pub students: usize,
    pub courses_per_teacher: usize,
    pub courses_per_student: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            teachers: 5,
            students: 50,
            courses_per_teacher: 2,
            courses_per_student: 3,
        }
    }
}

impl SeedConfig {
    pub fn new(teachers: usize, students: usize) -> Self {
        Self {
            teachers,
            students,
            ..Self::default()
        }
    }

    pub fn with_courses(mut self, per_teacher: usize, per_student: usize) -> Self {
        self.courses_per_teacher = per_teacher;
        self.courses_per_student = per_student;
        self
    }
}

/// Counts reported after a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub teachers: usize,
    pub students: usize,
    pub courses: usize,
    pub enrollments: usize,
}
