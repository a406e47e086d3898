mod common;

use common::{TestSchool, create_test_school};
use edumanage::{Decision, DecisionReason, PolicyEvaluator, PolicyRule, PolicyTable, Predicate};
use edumanage_config::PolicyConfig;
use edumanage_models::{
    Action, Actor, ActorId, ExtensionId, ProfileRole, ResourceClass, ResourceId, ResourceRef, Role,
};

/// Records covering owned, foreign and related variants of `class`.
///
/// `mine` holds every id the actor is known by (account and extensions), so
/// records keyed by the wrong one of them are covered too.
fn sample_records(
    class: ResourceClass,
    mine: &[ResourceId],
    related: &[ResourceId],
) -> Vec<ResourceRef> {
    let other = ResourceId::new();
    let mut ids: Vec<ResourceId> = related.to_vec();
    ids.push(ResourceId::new());
    ids.extend_from_slice(mine);

    let mut owners = mine.to_vec();
    owners.push(other);

    let mut records = Vec::new();
    for id in ids {
        records.push(ResourceRef::new(class, id));
        for &owner in &owners {
            let mut record = ResourceRef::new(class, id);
            for &field in class.ownership_fields() {
                record = record.with_owner(field, owner);
            }
            records.push(record);
        }
        if let &[first, second, ..] = class.ownership_fields() {
            for &owner in mine {
                records.push(
                    ResourceRef::new(class, id)
                        .with_owner(first, other)
                        .with_owner(second, owner),
                );
            }
        }
    }
    records
}

/// A school with one member of each role plus the T1/C1/S1 relations.
async fn populated_school() -> (TestSchool, Vec<Actor>, Vec<ResourceId>) {
    let school = create_test_school();
    let teacher = school.create_member(ProfileRole::Teacher).await;
    let student = school.create_member(ProfileRole::Student).await;
    let staff = school.create_member(ProfileRole::Staff).await;
    let admin = school.create_superuser().await;
    let nobody = school.create_actor().await;

    let course = school.store.add_course("Algebra", Some(teacher.ext())).await;
    let enrollment = school.store.enroll(student.ext(), course, true).await;

    let related = vec![
        ResourceId::from(student.ext()),
        ResourceId::from(course),
        ResourceId::from(enrollment),
    ];
    let actors = vec![
        teacher.actor,
        student.actor,
        staff.actor,
        admin,
        nobody,
    ];
    (school, actors, related)
}

#[tokio::test]
async fn test_admin_override_allows_everything() {
    let school = create_test_school();
    let admin = school.create_superuser().await;

    for class in ResourceClass::ALL {
        for action in Action::ALL {
            let record = ResourceRef::new(class, ResourceId::new());
            let decision = school.evaluator.can(&admin, action, &record).await.unwrap();
            assert!(decision.allowed, "{class} {action}");
            assert_eq!(decision.reason, DecisionReason::RoleAllow);
            assert_eq!(decision.role, Role::Admin);

            let scope = school.evaluator.scope(&admin, action, class).await.unwrap();
            assert_eq!(scope, Predicate::MatchAll);
        }
    }
}

#[tokio::test]
async fn test_staff_flag_admin_is_configurable() {
    let school = create_test_school();
    let member = school.create_member(ProfileRole::Teacher).await;
    let flagged = member.actor.clone().with_staff_flag(true);
    let record = ResourceRef::new(ResourceClass::DisciplineRecord, ResourceId::new());

    let default = school
        .evaluator
        .can(&flagged, Action::Delete, &record)
        .await
        .unwrap();
    assert!(default.allowed);
    assert_eq!(default.role, Role::Admin);

    let strict = PolicyEvaluator::with_config(
        school.store.clone(),
        &PolicyConfig {
            staff_flag_is_admin: false,
        },
    );
    let decision = strict.can(&flagged, Action::Delete, &record).await.unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.role, Role::Teacher);
    assert_eq!(decision.reason, DecisionReason::TableDeny);
}

#[tokio::test]
async fn test_absent_rule_denies() {
    let school = create_test_school();
    let student = school.create_member(ProfileRole::Student).await;
    let record = ResourceRef::new(ResourceClass::DisciplineRecord, ResourceId::new())
        .with_owner("reported_by_id", student.actor.id);

    let decision = school
        .evaluator
        .can(&student.actor, Action::Read, &record)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::TableDeny);

    let empty = PolicyEvaluator::new(school.store.clone())
        .with_table(PolicyTable::from_rules(Vec::<PolicyRule>::new()).unwrap());
    let course = ResourceRef::new(ResourceClass::Course, ResourceId::new());
    let decision = empty.can(&student.actor, Action::Read, &course).await.unwrap();
    assert!(!decision.allowed);
}

#[tokio::test]
async fn test_owner_symmetry() {
    let school = create_test_school();
    let student = school.create_member(ProfileRole::Student).await;

    let table = school.evaluator.table();
    let mut checked = 0;
    for class in ResourceClass::ALL {
        if table.lookup(Role::Student, class, Action::Read) != Decision::AllowIfOwner {
            continue;
        }
        let me = school
            .owner_value(student.actor.id, class)
            .await
            .unwrap_or_else(|| panic!("student cannot own {class}"));
        for &field in class.ownership_fields() {
            let mine = ResourceRef::new(class, ResourceId::new()).with_owner(field, me);
            let theirs =
                ResourceRef::new(class, ResourceId::new()).with_owner(field, ResourceId::new());

            let allowed = school.evaluator.can(&student.actor, Action::Read, &mine).await.unwrap();
            assert!(allowed.allowed, "{class}.{field}");
            assert_eq!(allowed.reason, DecisionReason::OwnerAllow);

            let denied = school.evaluator.can(&student.actor, Action::Read, &theirs).await.unwrap();
            assert!(!denied.allowed, "{class}.{field}");
            assert_eq!(denied.reason, DecisionReason::TableDeny);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[tokio::test]
async fn test_extension_keyed_records_are_owned_through_the_extension() {
    let school = create_test_school();
    let student = school.create_member(ProfileRole::Student).await;
    let teacher = school.create_member(ProfileRole::Teacher).await;

    let result = ResourceRef::new(ResourceClass::ExamResult, ResourceId::new())
        .with_owner("student_id", student.ext());
    let keyed_by_account = ResourceRef::new(ResourceClass::ExamResult, ResourceId::new())
        .with_owner("student_id", student.actor.id);

    let decision = school
        .evaluator
        .can(&student.actor, Action::Read, &result)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.reason, DecisionReason::OwnerAllow);
    let decision = school
        .evaluator
        .can(&student.actor, Action::Read, &keyed_by_account)
        .await
        .unwrap();
    assert!(!decision.allowed);

    let exam = ResourceRef::new(ResourceClass::Exam, ResourceId::new())
        .with_owner("created_by_id", teacher.ext());
    let colleague_exam = ResourceRef::new(ResourceClass::Exam, ResourceId::new())
        .with_owner("created_by_id", ExtensionId::new());
    assert!(
        school
            .evaluator
            .can(&teacher.actor, Action::Update, &exam)
            .await
            .unwrap()
            .allowed
    );
    assert!(
        !school
            .evaluator
            .can(&teacher.actor, Action::Delete, &colleague_exam)
            .await
            .unwrap()
            .allowed
    );
}

#[tokio::test]
async fn test_message_recipient_counts_as_owner() {
    let school = create_test_school();
    let student = school.create_member(ProfileRole::Student).await;
    let message = ResourceRef::new(ResourceClass::Message, ResourceId::new())
        .with_owner("sender_id", ActorId::new())
        .with_owner("recipient_id", student.actor.id);

    let decision = school
        .evaluator
        .can(&student.actor, Action::Read, &message)
        .await
        .unwrap();
    assert!(decision.allowed);
}

#[tokio::test]
async fn test_unclassified_actor_is_closed() {
    let (school, actors, related) = populated_school().await;
    let nobody = &actors[4];
    assert_eq!(school.evaluator.classify(nobody), Role::Unclassified);

    for class in ResourceClass::ALL {
        for action in Action::ALL {
            for record in sample_records(class, &[ResourceId::from(nobody.id)], &related) {
                let decision = school.evaluator.can(nobody, action, &record).await.unwrap();
                assert!(!decision.allowed);
                assert_eq!(decision.reason, DecisionReason::UnclassifiedDeny);
            }
            let scope = school.evaluator.scope(nobody, action, class).await.unwrap();
            assert_eq!(scope, Predicate::MatchNone);
        }
    }
}

#[tokio::test]
async fn test_can_and_scope_agree() {
    let (school, actors, related) = populated_school().await;

    for actor in &actors {
        let mine = school.identities(actor.id).await;
        for class in ResourceClass::ALL {
            for action in Action::ALL {
                let scope = school.evaluator.scope(actor, action, class).await.unwrap();
                for record in sample_records(class, &mine, &related) {
                    let decision = school.evaluator.can(actor, action, &record).await.unwrap();
                    assert_eq!(
                        decision.allowed,
                        scope.matches(&record),
                        "{} {class} {action} {:?}",
                        decision.role,
                        record
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_custom_table_rule_is_honoured() {
    let school = create_test_school();
    let staff = school.create_member(ProfileRole::Staff).await;
    let target = school.create_member(ProfileRole::Student).await;

    let default = school
        .evaluator
        .can_administer(&staff.actor, target.actor.id)
        .await
        .unwrap();
    assert!(!default.allowed);

    let table = PolicyTable::from_rules([PolicyRule {
        role: Role::Staff,
        class: ResourceClass::RoleProfile,
        action: Action::Administer,
        decision: Decision::Allow,
    }])
    .unwrap();
    let evaluator = PolicyEvaluator::new(school.store.clone()).with_table(table);
    let decision = evaluator
        .can_administer(&staff.actor, target.actor.id)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.reason, DecisionReason::RoleAllow);
}
