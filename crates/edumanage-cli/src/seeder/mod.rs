//! Demo data for exercising the policy engine against Postgres.
//!
//! Seeds teachers and students with provisioned profiles, courses taught by
//! the teachers and active enrollments linking students to those courses.

pub mod actors;
pub mod courses;
pub mod models;

pub use models::{SeedConfig, SeedSummary};

use edumanage::ProfileService;
use edumanage_models::{CourseId, ProfileRole};
use sqlx::PgPool;

pub async fn seed_all(
    db: &PgPool,
    profiles: &ProfileService,
    config: SeedConfig,
) -> anyhow::Result<SeedSummary> {
    println!("🌱 Seeding demo school...");

    let teachers = actors::seed_role(db, profiles, ProfileRole::Teacher, config.teachers).await?;
    let students = actors::seed_role(db, profiles, ProfileRole::Student, config.students).await?;

    let courses = courses::generate_courses(&teachers, config.courses_per_teacher);
    courses::insert_courses(db, &courses).await?;

    let course_ids: Vec<CourseId> = courses.iter().map(|c| c.id).collect();
    let plan = courses::plan_enrollments(&students, &course_ids, config.courses_per_student);
    let enrollments = courses::insert_enrollments(db, &plan).await?;

    let summary = SeedSummary {
        teachers: teachers.len(),
        students: students.len(),
        courses: courses.len(),
        enrollments: enrollments as usize,
    };
    println!("✅ Seeding complete: {:?}", summary);
    Ok(summary)
}
