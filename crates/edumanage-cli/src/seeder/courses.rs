//! Course and enrollment seeding.

use std::time::Instant;

use edumanage_models::{CourseId, ExtensionId};
use fake::Fake;
use fake::faker::lorem::en::Word;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::CourseSeed;

const SUBJECTS: [&str; 8] = [
    "Mathematics",
    "English",
    "Biology",
    "Chemistry",
    "Physics",
    "History",
    "Geography",
    "Computer Science",
];

/// 3 params per course or enrollment.
const BATCH_SIZE: usize = 1000;

pub fn generate_courses(teachers: &[ExtensionId], per_teacher: usize) -> Vec<CourseSeed> {
    teachers
        .par_iter()
        .enumerate()
        .flat_map(|(teacher_idx, &teacher)| {
            (0..per_teacher)
                .map(|course_idx| {
                    let subject = SUBJECTS[(teacher_idx + course_idx) % SUBJECTS.len()];
                    let topic: String = Word().fake();
                    CourseSeed {
                        id: CourseId::new(),
                        title: format!("{subject}: {topic}"),
                        instructor_id: teacher,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Spreads students over courses round-robin.
///
/// Student `i` takes courses `i, i+1, ...` modulo the course count, so no pair
/// repeats and every course gets students when there are enough of them.
pub fn plan_enrollments(
    students: &[ExtensionId],
    courses: &[CourseId],
    per_student: usize,
) -> Vec<(ExtensionId, CourseId)> {
    if courses.is_empty() {
        return Vec::new();
    }
    let per_student = per_student.min(courses.len());
    students
        .iter()
        .enumerate()
        .flat_map(|(idx, &student)| {
            (0..per_student).map(move |offset| (student, courses[(idx + offset) % courses.len()]))
        })
        .collect()
}

pub async fn insert_courses(db: &PgPool, courses: &[CourseSeed]) -> Result<(), sqlx::Error> {
    let start_time = Instant::now();
    println!("📚 Seeding {} courses...", courses.len());

    let mut tx = db.begin().await?;
    for chunk in courses.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO courses (id, title, instructor_id) ");
        query.push_values(chunk, |mut row, course| {
            row.push_bind(course.id)
                .push_bind(&course.title)
                .push_bind(course.instructor_id);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} courses in {:?}", courses.len(), start_time.elapsed());
    Ok(())
}

pub async fn insert_enrollments(
    db: &PgPool,
    enrollments: &[(ExtensionId, CourseId)],
) -> Result<u64, sqlx::Error> {
    let start_time = Instant::now();
    println!("📝 Enrolling students ({} enrollments)...", enrollments.len());

    let mut inserted = 0;
    let mut tx = db.begin().await?;
    for chunk in enrollments.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO course_enrollments (id, student_id, course_id) ");
        query.push_values(chunk, |mut row, &(student, course)| {
            row.push_bind(uuid::Uuid::new_v4())
                .push_bind(student)
                .push_bind(course);
        });
        query.push(" ON CONFLICT (student_id, course_id) DO NOTHING");
        inserted += query.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} enrollments in {:?}", inserted, start_time.elapsed());
    Ok(inserted)
}
