/// Reassociation tests
///
/// Binding single entities into a session: identity, snapshots, versions.
/// Run with: cargo test --test reassociation_tests
mod common;

use chrono::{TimeZone, Utc};
use memodb_session::{
    DbError, Document, EntityInstance, EntityKey, EntityStatus, LockMode, PropertyValue, Value,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_end_to_end_single_entity() {
    let mut session = common::session();
    let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
    let user = EntityInstance::new("User")
        .with_id(42)
        .with("name", "Ada")
        .with("createdAt", Value::Timestamp(t0))
        .into_ref();

    let entry = session.reassociate(&user).unwrap();

    let persister = session.metamodel().persister("User").unwrap().clone();
    let key = EntityKey::new(Value::Integer(42), persister).unwrap();
    assert_eq!(entry.key(), &key);
    assert_eq!(entry.status(), EntityStatus::Loaded);
    assert_eq!(entry.lock_mode(), LockMode::None);
    assert_eq!(entry.version(), None);
    assert!(entry.exists_in_storage());
    assert!(!entry.lazy_properties_unfetched());

    let state = entry.loaded_state();
    assert_eq!(state.len(), 2);
    assert_eq!(state.get(0).and_then(PropertyValue::as_scalar), Some(&Value::from("Ada")));
    assert_eq!(state.get(1).and_then(PropertyValue::as_scalar), Some(&Value::Timestamp(t0)));

    assert_eq!(session.entity_count(), 1);
    assert_eq!(session.get(&key), Some(&user));
}

#[test]
fn test_reassociating_same_instance_is_idempotent() {
    let mut session = common::session();
    let user = EntityInstance::new("User").with_id(1).with("name", "Ada").into_ref();

    session.reassociate(&user).unwrap();
    user.set("name", "Ada L.").unwrap();
    let second = session.reassociate(&user).unwrap();

    assert_eq!(session.entity_count(), 1);
    assert_eq!(
        second.loaded_state().get(0).and_then(PropertyValue::as_scalar),
        Some(&Value::from("Ada L."))
    );
    assert_eq!(session.entry(&user).unwrap().key(), second.key());
}

#[test]
fn test_conflicting_instance_is_rejected() {
    let mut session = common::session();
    let a = EntityInstance::new("User").with_id(7).with("name", "A").into_ref();
    let b = EntityInstance::new("User").with_id(7).with("name", "B").into_ref();

    session.reassociate(&a).unwrap();
    let err = session.reassociate(&b).unwrap_err();

    match err {
        DbError::NonUniqueObject {
            entity_name,
            identifier,
        } => {
            assert_eq!(entity_name, "User");
            assert_eq!(identifier, "7");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.entity_count(), 1);
    assert!(session.contains(&a));
    assert!(!session.contains(&b));
}

#[test]
fn test_snapshot_is_independent_of_live_entity() {
    let mut session = common::session();
    let settings = Document::new(json!({"theme": "dark"}));
    let profile = EntityInstance::new("Profile")
        .with_id(Uuid::new_v4())
        .with("displayName", "ada")
        .with("settings", settings.clone())
        .with("version", 4)
        .into_ref();

    let entry = session.reassociate(&profile).unwrap();

    settings.update(|doc| doc["theme"] = json!("light")).unwrap();
    profile.set("displayName", "grace").unwrap();

    let state = session.entry(&profile).unwrap().loaded_state().clone();
    assert_eq!(state.get(0).and_then(PropertyValue::as_scalar), Some(&Value::from("ada")));
    let snapshot_doc = state.get(1).and_then(PropertyValue::as_document).unwrap();
    assert!(!snapshot_doc.ptr_eq(&settings));
    assert_eq!(snapshot_doc.get().unwrap(), json!({"theme": "dark"}));
    assert_eq!(entry.version(), Some(&Value::Integer(4)));
}

#[test]
fn test_detached_instance_moves_between_sessions() {
    let mut first = common::session();
    let mut second = common::session();
    let user = EntityInstance::new("User").with_id(3).with("name", "Ada").into_ref();

    first.reassociate(&user).unwrap();
    first.clear();
    let entry = second.reassociate(&user).unwrap();

    assert!(second.contains(&user));
    assert!(!first.contains(&user));
    assert_eq!(entry.id(), &Value::Integer(3));
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_evicted_key_can_be_rebound_to_another_instance() {
    let mut session = common::session();
    let a = EntityInstance::new("User").with_id(5).into_ref();
    let b = EntityInstance::new("User").with_id(5).into_ref();

    session.reassociate(&a).unwrap();
    session.evict(&a).unwrap();
    session.reassociate(&b).unwrap();

    assert!(session.contains(&b));
    assert_eq!(session.entity_count(), 1);
}

#[test]
fn test_wrong_value_type_is_a_mapping_error() {
    let mut session = common::session();
    let user = EntityInstance::new("User").with_id(1).with("name", 99).into_ref();

    let err = session.reassociate(&user).unwrap_err();
    assert!(matches!(err, DbError::MappingError(_)));
    assert_eq!(session.entity_count(), 0);
}

#[test]
fn test_identifier_type_is_checked() {
    let mut session = common::session();
    let profile = EntityInstance::new("Profile").with_id(12).into_ref();

    let err = session.reassociate(&profile).unwrap_err();
    assert!(matches!(err, DbError::InvalidIdentifier(_)));
}

#[test]
fn test_float_identifier_conflicts_across_representations() {
    let mut session = common::session();
    let a = EntityInstance::new("Measure").with_id(1).with("label", "a").into_ref();
    let b = EntityInstance::new("Measure").with_id(1.0).with("label", "b").into_ref();

    let entry = session.reassociate(&a).unwrap();
    assert_eq!(entry.id(), &Value::Float(1.0));

    let err = session.reassociate(&b).unwrap_err();
    assert!(err.is_non_unique_object());
    assert_eq!(session.entity_count(), 1);
    assert!(!session.contains(&b));
}

#[test]
fn test_managed_instance_cannot_be_rebound_under_new_identifier() {
    let mut session = common::session();
    let parent = common::family(1, &[common::child(2, "kid")]);
    session.reassociate(&parent).unwrap();
    assert_eq!(session.collection_count(), 1);

    let persister = session.metamodel().persister("Parent").unwrap().clone();
    let err = session
        .reassociate_with(&parent, &Value::Integer(9), &persister)
        .unwrap_err();

    assert!(matches!(err, DbError::InvalidIdentifier(_)));
    assert_eq!(session.entry(&parent).unwrap().id(), &Value::Integer(1));
    assert_eq!(session.entity_count(), 2);
    assert_eq!(session.collection_count(), 1);

    session.evict(&parent).unwrap();
    assert_eq!(session.collection_count(), 0);
    session
        .reassociate_with(&parent, &Value::Integer(9), &persister)
        .unwrap();
    assert_eq!(session.entry(&parent).unwrap().id(), &Value::Integer(9));
}
