//! # Edit Dispatcher
//!
//! The single consumer of [`FieldChanged`] events. On each event it
//! re-serializes the whole top-level component that changed and overwrites
//! that one entry of the item's persisted component map.
//!
//! ## Suppression
//!
//! Nothing is written when updates are disabled globally, when the item
//! carries its own disable flag, or when the item holds no value tree for
//! the component.
//!
//! ## Storage
//!
//! Persistence goes through [`ComponentStore`]. [`BevyComponentsBlob`] is
//! the default store: a JSON object serialized to a string, keyed by
//! component long name, as hosts keep it in a `bevy_components` custom
//! property.

use cforge_registry::TypeRegistry;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{EditError, SerializeError, StoreError};
use crate::populate::populate_or_default;
use crate::serialize::ValueSerializer;
use crate::value::{FieldChanged, FieldPath, GroupValue};

/// Name of the custom property holding an item's component blob.
pub const COMPONENTS_PROPERTY: &str = "bevy_components";
/// Per-item flag suppressing writes.
pub const DISABLE_UPDATE_FLAG: &str = "__disable__update";

/// Persisted component values of one item.
pub trait ComponentStore {
    fn get(&self, component: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, component: &str, value: Value) -> Result<(), StoreError>;
}

/// A component map stored as a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BevyComponentsBlob {
    raw: String,
}

impl BevyComponentsBlob {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_inner(self) -> String {
        self.raw
    }

    /// The decoded map; an empty blob is an empty map.
    pub fn entries(&self) -> Result<Map<String, Value>, StoreError> {
        if self.raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&self.raw)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Corrupt(other.to_string())),
        }
    }
}

impl ComponentStore for BevyComponentsBlob {
    fn get(&self, component: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries()?.remove(component))
    }

    fn set(&mut self, component: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries()?;
        entries.insert(component.to_string(), value);
        self.raw = serde_json::to_string(&Value::Object(entries))?;
        Ok(())
    }
}

/// A host object carrying components: their value trees plus the store
/// they persist to.
#[derive(Debug, Clone)]
pub struct EditableItem<S> {
    pub name: String,
    /// Mirrors the item's `__disable__update` flag.
    pub disable_updates: bool,
    pub components: IndexMap<String, GroupValue>,
    pub store: S,
}

impl<S: ComponentStore> EditableItem<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            disable_updates: false,
            components: IndexMap::new(),
            store,
        }
    }

    /// Attach `component`, populated from the store when it holds a value.
    pub fn attach(&mut self, component: GroupValue) -> Result<(), StoreError> {
        let long_name = component.long_name().to_string();
        let value = match self.store.get(&long_name)? {
            Some(stored) => populate_or_default(component.handle(), &stored),
            None => component,
        };
        self.components.insert(long_name, value);
        Ok(())
    }
}

/// What an event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Updates are disabled globally or on the item.
    Suppressed,
    /// The item holds no value tree for the component.
    MissingComponent,
    /// The edited field does not notify.
    Unchanged,
    /// The component was written; carries the serialized value.
    Persisted(Value),
}

/// Routes change events to serialization and storage.
#[derive(Debug, Clone, Copy)]
pub struct EditDispatcher<'r> {
    serializer: ValueSerializer<'r>,
    updates_disabled: bool,
}

impl<'r> EditDispatcher<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            serializer: ValueSerializer::new(registry),
            updates_disabled: false,
        }
    }

    /// Mirror the host's `disable_all_object_updates` setting.
    pub fn with_updates_disabled(mut self, disabled: bool) -> Self {
        self.updates_disabled = disabled;
        self
    }

    /// Persist the component named by `event`.
    pub fn on_edit<S: ComponentStore>(
        &self,
        event: &FieldChanged,
        item: &mut EditableItem<S>,
    ) -> Result<EditOutcome, EditError> {
        if self.updates_disabled || item.disable_updates {
            tracing::debug!(item = %item.name, event = %event, "updates disabled; edit not persisted");
            return Ok(EditOutcome::Suppressed);
        }
        let Some(value) = item.components.get(&event.component) else {
            tracing::debug!(item = %item.name, component = %event.component, "no component metadata");
            return Ok(EditOutcome::MissingComponent);
        };
        let definition = self
            .serializer
            .registry()
            .definition(value.long_name())
            .ok_or_else(|| SerializeError::MissingDefinition {
                long_name: value.long_name().to_string(),
            })?;
        let json = self.serializer.serialize(value, &definition)?;
        item.store.set(&event.component, json.clone())?;
        tracing::info!(item = %item.name, component = %event.component, path = %event.path, "component persisted");
        Ok(EditOutcome::Persisted(json))
    }

    /// Set a leaf and dispatch the resulting event.
    pub fn apply<S: ComponentStore>(
        &self,
        item: &mut EditableItem<S>,
        component: &str,
        path: &FieldPath,
        value: Value,
    ) -> Result<EditOutcome, EditError> {
        let event = self.component_mut(item, component)?.set(component, path, value)?;
        match event {
            Some(event) => self.on_edit(&event, item),
            None => Ok(EditOutcome::Unchanged),
        }
    }

    /// Append a default item to a collection and dispatch.
    pub fn push<S: ComponentStore>(
        &self,
        item: &mut EditableItem<S>,
        component: &str,
        path: &FieldPath,
    ) -> Result<EditOutcome, EditError> {
        let event = self.component_mut(item, component)?.push_item(component, path)?;
        self.on_edit(&event, item)
    }

    /// Remove a collection item and dispatch.
    pub fn remove<S: ComponentStore>(
        &self,
        item: &mut EditableItem<S>,
        component: &str,
        path: &FieldPath,
        index: usize,
    ) -> Result<EditOutcome, EditError> {
        let event = self
            .component_mut(item, component)?
            .remove_item(component, path, index)?;
        self.on_edit(&event, item)
    }

    fn component_mut<'i, S>(
        &self,
        item: &'i mut EditableItem<S>,
        component: &str,
    ) -> Result<&'i mut GroupValue, EditError> {
        item.components
            .get_mut(component)
            .ok_or_else(|| EditError::UnknownComponent {
                component: component.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use cforge_registry::{GroupName, PrimitiveTable};
    use serde_json::json;

    use super::*;
    use crate::compile::SchemaCompiler;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::load(
            json!({ "$defs": {
                "Health": {
                    "typeInfo": "Struct",
                    "long_name": "Health",
                    "properties": {
                        "current": { "type": { "$ref": "#/$defs/f32" } },
                        "max": { "type": { "$ref": "#/$defs/f32" } }
                    }
                },
                "f32": { "typeInfo": "Value", "long_name": "f32" }
            }}),
            PrimitiveTable::builtin(),
        )
        .unwrap();
        SchemaCompiler::new(&mut registry).compile_all();
        registry
    }

    fn item(registry: &TypeRegistry, blob: &str) -> EditableItem<BevyComponentsBlob> {
        let handle = registry.cached_group(&GroupName::top_level("Health")).unwrap();
        let mut item = EditableItem::new("Cube", BevyComponentsBlob::new(blob));
        item.attach(GroupValue::instantiate(&handle)).unwrap();
        item
    }

    #[test]
    fn edit_overwrites_only_its_component() {
        let registry = registry();
        let mut item = item(&registry, r#"{"Name":"cube","Health":{"current":1.0,"max":9.0}}"#);
        let outcome = EditDispatcher::new(&registry)
            .apply(&mut item, "Health", &"current".parse().unwrap(), json!(50.0))
            .unwrap();
        assert_eq!(outcome, EditOutcome::Persisted(json!({ "current": 50.0, "max": 9.0 })));
        assert_eq!(
            item.store.entries().unwrap(),
            json!({ "Name": "cube", "Health": { "current": 50.0, "max": 9.0 } })
                .as_object()
                .cloned()
                .unwrap()
        );
    }

    #[test]
    fn disabled_updates_are_suppressed() {
        let registry = registry();
        let mut item = item(&registry, "");
        let path: FieldPath = "current".parse().unwrap();

        let outcome = EditDispatcher::new(&registry)
            .with_updates_disabled(true)
            .apply(&mut item, "Health", &path, json!(1.0))
            .unwrap();
        assert_eq!(outcome, EditOutcome::Suppressed);

        item.disable_updates = true;
        let outcome = EditDispatcher::new(&registry)
            .apply(&mut item, "Health", &path, json!(2.0))
            .unwrap();
        assert_eq!(outcome, EditOutcome::Suppressed);
        assert_eq!(item.store.as_str(), "");
    }

    #[test]
    fn event_for_unknown_component_is_a_no_op() {
        let registry = registry();
        let mut item = item(&registry, "{}");
        let event = FieldChanged {
            component: "Mana".into(),
            path: "current".parse().unwrap(),
        };
        assert_eq!(
            EditDispatcher::new(&registry).on_edit(&event, &mut item).unwrap(),
            EditOutcome::MissingComponent
        );
        assert_eq!(item.store.as_str(), "{}");
    }

    #[test]
    fn corrupt_blob_is_reported() {
        let registry = registry();
        let handle = registry.cached_group(&GroupName::top_level("Health")).unwrap();
        let mut item = EditableItem::new("Cube", BevyComponentsBlob::new("[1]"));
        assert!(matches!(
            item.attach(GroupValue::instantiate(&handle)),
            Err(StoreError::Corrupt(_))
        ));
    }
}
