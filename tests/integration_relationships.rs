mod common;

use std::collections::BTreeSet;

use common::create_test_school;
use edumanage::{DecisionReason, Predicate, RelationshipStore, ScopeKey};
use edumanage_models::{Action, ProfileRole, ResourceClass, ResourceId, ResourceRef, Role};

#[tokio::test]
async fn test_teacher_sees_only_actively_enrolled_students() {
    let school = create_test_school();
    let t1 = school.create_member(ProfileRole::Teacher).await;
    let s1 = school.create_member(ProfileRole::Student).await;
    let s2 = school.create_member(ProfileRole::Student).await;

    let c1 = school.store.add_course("Algebra I", Some(t1.ext())).await;
    school.store.enroll(s1.ext(), c1, true).await;
    school.store.enroll(s2.ext(), c1, false).await;

    let related = school
        .evaluator
        .related_ids(&t1.actor, ResourceClass::Student)
        .await
        .unwrap();

    assert_eq!(related.key, ScopeKey::Id);
    assert_eq!(related.ids, BTreeSet::from([ResourceId::from(s1.ext())]));
}

#[tokio::test]
async fn test_deactivated_enrollment_drops_out_of_scope() {
    let school = create_test_school();
    let teacher = school.create_member(ProfileRole::Teacher).await;
    let student = school.create_member(ProfileRole::Student).await;
    let course = school.store.add_course("Biology", Some(teacher.ext())).await;
    let enrollment = school.store.enroll(student.ext(), course, true).await;

    let record = ResourceRef::new(ResourceClass::Student, student.ext())
        .with_owner("actor_id", student.actor.id);
    let before = school
        .evaluator
        .can(&teacher.actor, Action::Read, &record)
        .await
        .unwrap();
    assert!(before.allowed);

    assert!(school.store.set_enrollment_active(enrollment, false).await);

    let after = school
        .evaluator
        .can(&teacher.actor, Action::Read, &record)
        .await
        .unwrap();
    assert!(!after.allowed);
    let scope = school
        .evaluator
        .scope(&teacher.actor, Action::ReadCollection, ResourceClass::Student)
        .await
        .unwrap();
    assert_eq!(scope, Predicate::MatchNone);
}

#[tokio::test]
async fn test_students_in_several_courses_are_listed_once() {
    let school = create_test_school();
    let teacher = school.create_member(ProfileRole::Teacher).await;
    let student = school.create_member(ProfileRole::Student).await;
    let algebra = school.store.add_course("Algebra", Some(teacher.ext())).await;
    let geometry = school.store.add_course("Geometry", Some(teacher.ext())).await;
    school.store.enroll(student.ext(), algebra, true).await;
    school.store.enroll(student.ext(), geometry, true).await;

    let related = school
        .evaluator
        .related_ids(&teacher.actor, ResourceClass::Student)
        .await
        .unwrap();

    assert_eq!(related.ids.len(), 1);
}

#[tokio::test]
async fn test_other_teachers_courses_are_not_related() {
    let school = create_test_school();
    let teacher = school.create_member(ProfileRole::Teacher).await;
    let colleague = school.create_member(ProfileRole::Teacher).await;
    let student = school.create_member(ProfileRole::Student).await;
    let course = school.store.add_course("History", Some(colleague.ext())).await;
    school.store.enroll(student.ext(), course, true).await;

    let students = school
        .evaluator
        .related_ids(&teacher.actor, ResourceClass::Student)
        .await
        .unwrap();
    assert!(students.is_empty());

    let course_record = ResourceRef::new(ResourceClass::Course, course);
    let decision = school
        .evaluator
        .can(&teacher.actor, Action::Update, &course_record)
        .await
        .unwrap();
    assert!(!decision.allowed);
}

#[tokio::test]
async fn test_teacher_without_extension_has_no_students() {
    let school = create_test_school();
    let actor = school.create_actor().await;
    // Profile written directly, skipping the extension the lifecycle would create.
    let profile = edumanage_models::RoleProfile {
        actor_id: actor.id,
        role: ProfileRole::Teacher,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let teacher = actor.with_profile(profile);
    school.store.register_actor(&teacher).await;

    let related = school
        .evaluator
        .related_ids(&teacher, ResourceClass::Student)
        .await
        .unwrap();
    assert!(related.is_empty());

    let scope = school
        .evaluator
        .scope(&teacher, Action::ReadCollection, ResourceClass::Student)
        .await
        .unwrap();
    assert!(scope.matches_nothing());
}

#[tokio::test]
async fn test_teacher_courses_and_enrollments() {
    let school = create_test_school();
    let teacher = school.create_member(ProfileRole::Teacher).await;
    let student = school.create_member(ProfileRole::Student).await;
    let course = school.store.add_course("Chemistry", Some(teacher.ext())).await;
    let other = school.store.add_course("Physics", None).await;
    let active = school.store.enroll(student.ext(), course, true).await;
    school.store.enroll(student.ext(), other, true).await;

    let courses = school
        .evaluator
        .related_ids(&teacher.actor, ResourceClass::Course)
        .await
        .unwrap();
    assert_eq!(courses.ids, BTreeSet::from([ResourceId::from(course)]));

    let enrollments = school
        .evaluator
        .related_ids(&teacher.actor, ResourceClass::Enrollment)
        .await
        .unwrap();
    assert_eq!(enrollments.ids, BTreeSet::from([ResourceId::from(active)]));
}

#[tokio::test]
async fn test_student_course_collection_is_active_enrollments() {
    let school = create_test_school();
    let student = school.create_member(ProfileRole::Student).await;
    let current = school.store.add_course("English", None).await;
    let dropped = school.store.add_course("French", None).await;
    let untaken = school.store.add_course("Music", None).await;
    school.store.enroll(student.ext(), current, true).await;
    school.store.enroll(student.ext(), dropped, false).await;

    let scope = school
        .evaluator
        .scope(&student.actor, Action::ReadCollection, ResourceClass::Course)
        .await
        .unwrap();

    let records: Vec<ResourceRef> = [current, dropped, untaken]
        .into_iter()
        .map(|id| ResourceRef::new(ResourceClass::Course, id))
        .collect();
    let visible = scope.filter(records);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, ResourceId::from(current));

    // Reading a single course stays open to every student.
    let single = ResourceRef::new(ResourceClass::Course, untaken);
    let decision = school
        .evaluator
        .can(&student.actor, Action::Read, &single)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.role, Role::Student);
}

#[tokio::test]
async fn test_student_sees_own_enrollment_rows() {
    let school = create_test_school();
    let student = school.create_member(ProfileRole::Student).await;
    let classmate = school.create_member(ProfileRole::Student).await;
    let course = school.store.add_course("Geography", None).await;
    let mine = school.store.enroll(student.ext(), course, true).await;
    let theirs = school.store.enroll(classmate.ext(), course, true).await;

    let rows = school.store.active_enrollments_in(&[course]).await.unwrap();
    assert_eq!(rows.len(), 2);

    for row in &rows {
        let decision = school
            .evaluator
            .can(&student.actor, Action::Read, row)
            .await
            .unwrap();
        if row.id == mine {
            assert!(decision.allowed);
            assert_eq!(decision.reason, DecisionReason::OwnerAllow);
        } else {
            assert_eq!(row.id, theirs);
            assert!(!decision.allowed);
            assert_eq!(decision.reason, DecisionReason::TableDeny);
        }
    }

    let scope = school
        .evaluator
        .scope(&student.actor, Action::ReadCollection, ResourceClass::Enrollment)
        .await
        .unwrap();
    assert_eq!(
        scope,
        Predicate::KeyIn {
            key: ScopeKey::Owner(&["student_id"]),
            ids: BTreeSet::from([ResourceId::from(student.ext())]).into(),
        }
    );
    let visible = scope.filter(rows);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, mine);
}

#[tokio::test]
async fn test_teacher_and_student_agree_on_enrollment_rows() {
    let school = create_test_school();
    let teacher = school.create_member(ProfileRole::Teacher).await;
    let student = school.create_member(ProfileRole::Student).await;
    let course = school.store.add_course("Art", Some(teacher.ext())).await;
    school.store.enroll(student.ext(), course, true).await;

    let rows = school.store.active_enrollments_of(student.ext()).await.unwrap();
    assert_eq!(rows.len(), 1);

    for actor in [&teacher.actor, &student.actor] {
        let decision = school
            .evaluator
            .can(actor, Action::Read, &rows[0])
            .await
            .unwrap();
        assert!(decision.allowed, "{}", decision.role);
    }
}
