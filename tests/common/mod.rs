//! Shared mappings and graph builders for the integration tests.
#![allow(dead_code)]

use memodb_session::{
    DataType, EntityCollection, EntityInstance, EntityPersister, EntityRef, Metamodel,
    PropertyDescriptor, Session, SessionConfig,
};
use std::sync::Arc;

pub fn metamodel() -> Arc<Metamodel> {
    let user = EntityPersister::builder("User")
        .property(PropertyDescriptor::scalar("name", DataType::Text))
        .property(PropertyDescriptor::scalar("createdAt", DataType::Timestamp).not_updateable())
        .build()
        .unwrap();

    let profile = EntityPersister::builder("Profile")
        .identifier("id", DataType::Uuid)
        .property(PropertyDescriptor::scalar("displayName", DataType::Text))
        .property(PropertyDescriptor::document("settings"))
        .version("version", DataType::Integer)
        .build()
        .unwrap();

    let parent = EntityPersister::builder("Parent")
        .property(PropertyDescriptor::scalar("name", DataType::Text))
        .property(PropertyDescriptor::many_to_one("child", "Child"))
        .property(PropertyDescriptor::one_to_many("children", "Child"))
        .build()
        .unwrap();

    let child = EntityPersister::builder("Child")
        .property(PropertyDescriptor::scalar("name", DataType::Text))
        .property(PropertyDescriptor::many_to_one("parent", "Parent"))
        .build()
        .unwrap();

    let measure = EntityPersister::builder("Measure")
        .identifier("id", DataType::Float)
        .property(PropertyDescriptor::scalar("label", DataType::Text))
        .build()
        .unwrap();

    let model = Metamodel::new()
        .with_persister(user)
        .and_then(|m| m.with_persister(profile))
        .and_then(|m| m.with_persister(parent))
        .and_then(|m| m.with_persister(child))
        .and_then(|m| m.with_persister(measure))
        .unwrap();
    model.validate().unwrap();
    Arc::new(model)
}

pub fn session() -> Session {
    Session::new(metamodel(), SessionConfig::default())
}

pub fn session_with(config: SessionConfig) -> Session {
    Session::new(metamodel(), config)
}

pub fn child(id: i64, name: &str) -> EntityRef {
    EntityInstance::new("Child").with_id(id).with("name", name).into_ref()
}

/// Parent whose `children` collection holds `children`, each pointing back.
pub fn family(parent_id: i64, children: &[EntityRef]) -> EntityRef {
    let parent = EntityInstance::new("Parent")
        .with_id(parent_id)
        .with("name", format!("parent-{parent_id}").as_str())
        .with("children", EntityCollection::new(children.to_vec()))
        .into_ref();
    for c in children {
        c.set("parent", parent.clone()).unwrap();
    }
    parent
}
