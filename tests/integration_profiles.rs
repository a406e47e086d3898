mod common;

use std::collections::HashSet;

use common::create_test_school;
use edumanage::ProfileError;
use edumanage_models::{ExtensionKind, ProfileRole, Role};

#[tokio::test]
async fn test_ensure_profile_is_idempotent() {
    let school = create_test_school();
    let actor = school.create_actor().await;

    let first = school
        .profiles
        .ensure_profile(actor.id, ProfileRole::Student)
        .await
        .unwrap();
    let second = school
        .profiles
        .ensure_profile(actor.id, ProfileRole::Student)
        .await
        .unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    let first_ext = first.extension.unwrap();
    let second_ext = second.extension.unwrap();
    assert_eq!(first_ext.id, second_ext.id);
    assert_eq!(first_ext.business_id, "STU000001");

    let history = school.profiles.history(actor.id).await.unwrap();
    assert_eq!(history.extensions.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_profile_converges() {
    let school = create_test_school();
    let actor = school.create_actor().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let profiles = school.profiles.clone();
        let id = actor.id;
        handles.push(tokio::spawn(async move {
            profiles.ensure_profile(id, ProfileRole::Teacher).await
        }));
    }

    let mut extension_ids = HashSet::new();
    let mut created = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if outcome.changed {
            created += 1;
        }
        extension_ids.insert(outcome.extension.unwrap().id);
    }

    assert_eq!(created, 1);
    assert_eq!(extension_ids.len(), 1);
    let history = school.profiles.history(actor.id).await.unwrap();
    assert_eq!(history.extensions.len(), 1);
}

#[tokio::test]
async fn test_switch_role_preserves_history() {
    let school = create_test_school();
    let member = school.create_member(ProfileRole::Student).await;
    let student_ext = member.ext();

    let switched = school
        .profiles
        .switch_role(member.actor.id, ProfileRole::Teacher)
        .await
        .unwrap();

    assert!(switched.changed);
    assert_eq!(switched.profile.role, ProfileRole::Teacher);
    let teacher_ext = switched.extension.unwrap();
    assert_eq!(teacher_ext.kind, ExtensionKind::Teacher);

    let old = school.profiles.extension(student_ext).await.unwrap().unwrap();
    assert_eq!(old.kind, ExtensionKind::Student);

    let history = school.profiles.history(member.actor.id).await.unwrap();
    let kinds: Vec<ExtensionKind> = history.extensions.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ExtensionKind::Student, ExtensionKind::Teacher]);

    let reloaded = school.reload(member.actor.id).await;
    assert_eq!(school.evaluator.classify(&reloaded), Role::Teacher);
}

#[tokio::test]
async fn test_switch_back_reuses_old_extension() {
    let school = create_test_school();
    let member = school.create_member(ProfileRole::Student).await;
    let original = member.ext();

    school
        .profiles
        .switch_role(member.actor.id, ProfileRole::Staff)
        .await
        .unwrap();
    let back = school
        .profiles
        .switch_role(member.actor.id, ProfileRole::Student)
        .await
        .unwrap();

    assert_eq!(back.extension.unwrap().id, original);
    let history = school.profiles.history(member.actor.id).await.unwrap();
    assert_eq!(history.extensions.len(), 2);
}

#[tokio::test]
async fn test_switch_to_held_role_is_noop() {
    let school = create_test_school();
    let member = school.create_member(ProfileRole::Teacher).await;

    let outcome = school
        .profiles
        .switch_role(member.actor.id, ProfileRole::Teacher)
        .await
        .unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.extension.unwrap().id, member.ext());
}

#[tokio::test]
async fn test_switch_without_profile_is_invalid() {
    let school = create_test_school();
    let actor = school.create_actor().await;

    let err = school
        .profiles
        .switch_role(actor.id, ProfileRole::Teacher)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProfileError::InvalidTransition { from: None, .. }
    ));
    assert!(school.profiles.profile(actor.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_role_name_is_invalid() {
    let school = create_test_school();
    let actor = school.create_actor().await;

    let err = school
        .profiles
        .ensure_profile_named(actor.id, "headmaster")
        .await
        .unwrap_err();

    assert!(matches!(err, ProfileError::InvalidTransition { .. }));
    assert!(school.profiles.profile(actor.id).await.unwrap().is_none());

    let provisioned = school
        .profiles
        .ensure_profile_named(actor.id, "Staff")
        .await
        .unwrap();
    assert_eq!(provisioned.profile.role, ProfileRole::Staff);
}

#[tokio::test]
async fn test_ensure_profile_with_other_role_conflicts() {
    let school = create_test_school();
    let member = school.create_member(ProfileRole::Student).await;

    let err = school
        .profiles
        .ensure_profile(member.actor.id, ProfileRole::Teacher)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProfileError::RoleConflict {
            current: ProfileRole::Student,
            requested: ProfileRole::Teacher,
            ..
        }
    ));
    let history = school.profiles.history(member.actor.id).await.unwrap();
    assert_eq!(history.extensions.len(), 1);
    assert_eq!(history.profile.unwrap().role, ProfileRole::Student);
}
