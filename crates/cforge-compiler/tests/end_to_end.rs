//! Compile the fixture registry, edit components, and persist them.

use cforge_compiler::{
    BevyComponentsBlob, ComponentStore, EditDispatcher, EditOutcome, EditableItem, FieldPath,
    GroupValue, SchemaCompiler, ValueSerializer,
};
use cforge_registry::{FieldSpec, GroupName, GroupShape, PrimitiveTable, TypeRegistry};
use serde_json::json;

const FIXTURE: &str = include_str!("fixtures/registry.json");

fn compiled_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::from_json_str(FIXTURE, PrimitiveTable::builtin()).unwrap();
    SchemaCompiler::new(&mut registry).compile_all();
    registry
}

fn instance(registry: &TypeRegistry, component: &str) -> GroupValue {
    GroupValue::instantiate(&registry.cached_group(&GroupName::top_level(component)).unwrap())
}

#[test]
fn health_edit_merges_into_existing_blob() {
    let registry = compiled_registry();
    let mut item = EditableItem::new(
        "Cube",
        BevyComponentsBlob::new(r#"{"bevy_core::name::Name":"Cube.001"}"#),
    );
    item.attach(instance(&registry, "Health")).unwrap();

    let outcome = EditDispatcher::new(&registry)
        .apply(&mut item, "Health", &"current".parse().unwrap(), json!(50.0))
        .unwrap();

    assert_eq!(outcome, EditOutcome::Persisted(json!({ "current": 50.0, "max": 0.0 })));
    assert_eq!(
        item.store.get("Health").unwrap(),
        Some(json!({ "current": 50.0, "max": 0.0 }))
    );
    assert_eq!(
        item.store.get("bevy_core::name::Name").unwrap(),
        Some(json!("Cube.001"))
    );
}

#[test]
fn tags_self_referential_vec_round_trips() {
    let registry = compiled_registry();
    let tags = registry.cached_group(&GroupName::top_level("Tags")).unwrap();

    let Some(FieldSpec::Nested(list)) = tags.group.field("0") else {
        panic!("slot 0 should be a nested list group");
    };
    assert_eq!(list.group.shape, GroupShape::List);
    let Some(FieldSpec::Collection(item)) = list.group.field("list") else {
        panic!("list group should hold a collection");
    };
    assert_eq!(item.group.shape, GroupShape::Wrapper);
    assert_eq!(item.group.long_name, "alloc::string::String");

    let mut item = EditableItem::new("Cube", BevyComponentsBlob::default());
    item.attach(GroupValue::instantiate(&tags)).unwrap();
    let dispatcher = EditDispatcher::new(&registry);
    let list_path: FieldPath = "0.list".parse().unwrap();
    for (index, tag) in ["a", "b"].into_iter().enumerate() {
        dispatcher.push(&mut item, "Tags", &list_path).unwrap();
        dispatcher
            .apply(
                &mut item,
                "Tags",
                &list_path.clone().index(index).field("value"),
                json!(tag),
            )
            .unwrap();
    }

    let stored: serde_json::Value = serde_json::from_str(item.store.as_str()).unwrap();
    assert_eq!(stored, json!({ "Tags": ["a", "b"] }));
}

#[test]
fn defaults_for_every_component() {
    let registry = compiled_registry();
    let serializer = ValueSerializer::new(&registry);
    for (component, expected) in [
        ("Health", json!({ "current": 0.0, "max": 0.0 })),
        ("Tags", json!([])),
        ("game::Inventory", json!({ "owner": "", "items": [], "open": false })),
        ("game::Weapon", json!("Fists")),
        ("game::Position", json!([0.0, 0.0])),
        ("game::Visited", json!([])),
        ("game::Player", json!(null)),
        ("game::Broken", json!({ "speed": 0.0 })),
    ] {
        let value = instance(&registry, component);
        assert_eq!(serializer.serialize_component(&value).unwrap(), expected, "{component}");
    }
}

#[test]
fn inventory_items_are_struct_groups() {
    let registry = compiled_registry();
    let mut item = EditableItem::new("Chest", BevyComponentsBlob::default());
    item.attach(instance(&registry, "game::Inventory")).unwrap();
    let dispatcher = EditDispatcher::new(&registry);

    let items: FieldPath = "items.list".parse().unwrap();
    dispatcher.push(&mut item, "game::Inventory", &items).unwrap();
    dispatcher
        .apply(&mut item, "game::Inventory", &"items.list[0].name".parse().unwrap(), json!("rope"))
        .unwrap();
    let outcome = dispatcher
        .apply(&mut item, "game::Inventory", &"items.list[0].weight".parse().unwrap(), json!(2))
        .unwrap();

    assert_eq!(
        outcome,
        EditOutcome::Persisted(json!({
            "owner": "",
            "items": [ { "name": "rope", "weight": 2.0 } ],
            "open": false
        }))
    );
}

#[test]
fn stored_values_are_populated_on_attach() {
    let registry = compiled_registry();
    let mut item = EditableItem::new(
        "Archer",
        BevyComponentsBlob::new(r#"{"game::Weapon":{"Bow":12},"game::Visited":[4,4,9]}"#),
    );
    item.attach(instance(&registry, "game::Weapon")).unwrap();
    item.attach(instance(&registry, "game::Visited")).unwrap();

    let serializer = ValueSerializer::new(&registry);
    assert_eq!(
        serializer.serialize_component(&item.components["game::Weapon"]).unwrap(),
        json!({ "Bow": 12 })
    );
    assert_eq!(
        serializer.serialize_component(&item.components["game::Visited"]).unwrap(),
        json!([4, 9])
    );
}

#[test]
fn opaque_fields_survive_an_edit_of_their_neighbour() {
    let registry = compiled_registry();
    let mut item = EditableItem::new(
        "Cart",
        BevyComponentsBlob::new(r#"{"game::Mover":{"pos":[1,2,3],"speed":1,"tag":{"x":1}}}"#),
    );
    item.attach(instance(&registry, "game::Mover")).unwrap();

    let outcome = EditDispatcher::new(&registry)
        .apply(&mut item, "game::Mover", &"speed".parse().unwrap(), json!(2.0))
        .unwrap();

    let expected = json!({ "pos": [1, 2, 3], "speed": 2.0, "tag": { "x": 1 } });
    assert_eq!(outcome, EditOutcome::Persisted(expected.clone()));
    assert_eq!(item.store.get("game::Mover").unwrap(), Some(expected));
}

#[test]
fn broken_component_is_reported() {
    let registry = compiled_registry();
    let diagnostics = registry.diagnostics();
    assert!(diagnostics.is_missing("game::Ghost"));
    assert!(diagnostics.is_invalid("game::Broken"));
    assert!(!diagnostics.is_invalid("Health"));
}

#[test]
fn wrong_value_types_are_rejected_without_persisting() {
    let registry = compiled_registry();
    let mut item = EditableItem::new("Cube", BevyComponentsBlob::default());
    item.attach(instance(&registry, "Health")).unwrap();
    let result = EditDispatcher::new(&registry).apply(
        &mut item,
        "Health",
        &"current".parse().unwrap(),
        json!("full"),
    );
    assert!(result.is_err());
    assert_eq!(item.store.as_str(), "");
}
