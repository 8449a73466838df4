//! # Value Serializer
//!
//! Converts a value tree back into the schema's native JSON shape.
//!
//! ## Shape Rules
//!
//! | group shape   | JSON                                                |
//! |---------------|-----------------------------------------------------|
//! | Struct        | object by property name, empty placeholders omitted |
//! | Tuple         | array by slot                                       |
//! | TupleStruct   | the slot's value for one slot, otherwise array      |
//! | List          | array in order                                      |
//! | Set           | array of distinct items, first occurrence wins      |
//! | Enum          | `"Name"` or `{"Name": payload}`                     |
//! | Value         | stored JSON, else primitive default, else `null`    |
//! | UnitStruct    | `null`                                              |
//! | Wrapper       | the wrapped `value`                                 |
//!
//! A one-slot tuple payload of an enum variant serializes as its slot value.
//! Placeholders that were populated from the store emit that JSON as is.

use cforge_registry::{
    FieldSpec, GroupHandle, GroupShape, TypeDefinition, TypeRegistry, WRAPPER_VALUE_FIELD,
};
use serde_json::{Map, Value};

use crate::error::SerializeError;
use crate::handlers::{collection_field, SELECTION_FIELD, VARIANT_PREFIX};
use crate::value::{FieldValue, GroupValue};

/// Serializes value trees against the registry they were compiled from.
#[derive(Debug, Clone, Copy)]
pub struct ValueSerializer<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> ValueSerializer<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Serialize `value` as an instance of `definition`.
    ///
    /// # Errors
    ///
    /// [`SerializeError::ShapeMismatch`] when the value was compiled from a
    /// type of another kind, plus whatever the value tree itself violates.
    pub fn serialize(&self, value: &GroupValue, definition: &TypeDefinition) -> Result<Value, SerializeError> {
        let expected = GroupShape::from(definition.kind()?);
        if value.shape() != expected {
            return Err(SerializeError::ShapeMismatch {
                long_name: definition.display_name().to_string(),
                expected: expected.to_string(),
                found: value.shape().to_string(),
            });
        }
        self.serialize_group(value)
    }

    /// Serialize a top-level component, looking its definition up by the
    /// value's long name.
    pub fn serialize_component(&self, value: &GroupValue) -> Result<Value, SerializeError> {
        let definition =
            self.registry
                .definition(value.long_name())
                .ok_or_else(|| SerializeError::MissingDefinition {
                    long_name: value.long_name().to_string(),
                })?;
        self.serialize(value, &definition)
    }

    /// The canonical default JSON of a compiled group.
    pub fn default_json(&self, handle: &GroupHandle) -> Result<Value, SerializeError> {
        self.serialize_group(&GroupValue::instantiate(handle))
    }

    fn serialize_group(&self, value: &GroupValue) -> Result<Value, SerializeError> {
        match value.shape() {
            GroupShape::Struct => {
                let mut object = Map::new();
                for (name, field) in value.fields() {
                    if let Some(json) = self.serialize_field(field)? {
                        object.insert(name.to_string(), json);
                    }
                }
                Ok(Value::Object(object))
            }
            GroupShape::Tuple => self.serialize_slots(value).map(Value::Array),
            GroupShape::TupleStruct => {
                let mut slots = self.serialize_slots(value)?;
                if slots.len() == 1 {
                    Ok(slots.remove(0))
                } else {
                    Ok(Value::Array(slots))
                }
            }
            GroupShape::List | GroupShape::Set => self.serialize_collection(value),
            GroupShape::Enum => self.serialize_enum(value),
            GroupShape::Value => Ok(value
                .stored()
                .or_else(|| self.registry.primitives().default_value(value.long_name()))
                .cloned()
                .unwrap_or(Value::Null)),
            GroupShape::UnitStruct => Ok(Value::Null),
            GroupShape::Wrapper => Ok(value
                .primitive(WRAPPER_VALUE_FIELD)
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    /// `None` for placeholders with nothing stored.
    fn serialize_field(&self, field: &FieldValue) -> Result<Option<Value>, SerializeError> {
        match field {
            FieldValue::Primitive(value) => Ok(Some(value.clone())),
            FieldValue::Placeholder { stored, .. } => Ok(stored.clone()),
            FieldValue::Group(group) => self.serialize_group(group).map(Some),
            FieldValue::Collection(collection) => collection
                .items
                .iter()
                .map(|item| self.serialize_group(item))
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(Value::Array(items))),
        }
    }

    /// Positional slots; placeholder slots keep their position as `null`.
    fn serialize_slots(&self, value: &GroupValue) -> Result<Vec<Value>, SerializeError> {
        let mut slots = Vec::new();
        for (name, field) in value.fields() {
            if name.parse::<usize>().is_err() {
                continue;
            }
            slots.push(self.serialize_field(field)?.unwrap_or(Value::Null));
        }
        Ok(slots)
    }

    fn serialize_collection(&self, value: &GroupValue) -> Result<Value, SerializeError> {
        let field = collection_field(value.shape()).unwrap_or("list");
        let Some(FieldValue::Collection(collection)) = value.get(field) else {
            return Err(self.mismatch(value, "collection field", "none"));
        };
        let mut items = Vec::with_capacity(collection.items.len());
        for item in &collection.items {
            let json = self.serialize_group(item)?;
            if value.shape() == GroupShape::Set && items.contains(&json) {
                continue;
            }
            items.push(json);
        }
        Ok(Value::Array(items))
    }

    fn serialize_enum(&self, value: &GroupValue) -> Result<Value, SerializeError> {
        let selection = value
            .primitive(SELECTION_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| self.mismatch(value, "variant selection", "none"))?;
        let declared = match value.layout().field(SELECTION_FIELD) {
            Some(FieldSpec::Primitive(field)) => field.options.iter().any(|o| o == selection),
            _ => false,
        };
        if !declared {
            return Err(SerializeError::UnknownVariant {
                long_name: value.long_name().to_string(),
                variant: selection.to_string(),
            });
        }

        let payload = match value.get(&format!("{VARIANT_PREFIX}{selection}")) {
            None => return Ok(Value::String(selection.to_string())),
            Some(FieldValue::Group(payload)) => payload,
            Some(FieldValue::Placeholder { stored: Some(raw), .. }) => {
                let mut object = Map::new();
                object.insert(selection.to_string(), raw.clone());
                return Ok(Value::Object(object));
            }
            Some(_) => {
                return Err(SerializeError::MissingVariantData {
                    long_name: value.long_name().to_string(),
                    variant: selection.to_string(),
                })
            }
        };
        let json = match payload.shape() {
            GroupShape::Tuple | GroupShape::TupleStruct => {
                let mut slots = self.serialize_slots(payload)?;
                if slots.len() == 1 {
                    slots.remove(0)
                } else {
                    Value::Array(slots)
                }
            }
            _ => self.serialize_group(payload)?,
        };
        let mut object = Map::new();
        object.insert(selection.to_string(), json);
        Ok(Value::Object(object))
    }

    fn mismatch(&self, value: &GroupValue, expected: &str, found: &str) -> SerializeError {
        SerializeError::ShapeMismatch {
            long_name: value.long_name().to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cforge_registry::{PrimitiveTable, TypeRegistry};
    use serde_json::json;

    use super::*;
    use crate::compile::SchemaCompiler;
    use crate::value::FieldPath;

    fn registry() -> TypeRegistry {
        let mut primitives = PrimitiveTable::builtin();
        primitives.insert_default("glam::Vec2", json!([0.0, 0.0]));
        let mut registry = TypeRegistry::load(
            json!({ "$defs": {
                "game::Health": {
                    "typeInfo": "Struct",
                    "long_name": "game::Health",
                    "properties": {
                        "current": { "type": { "$ref": "#/$defs/f32" } },
                        "max": { "type": { "$ref": "#/$defs/f32" } },
                        "ghost": { "type": { "$ref": "#/$defs/game::Ghost" } }
                    }
                },
                "game::Speed": {
                    "typeInfo": "TupleStruct",
                    "long_name": "game::Speed",
                    "prefixItems": [ { "type": { "$ref": "#/$defs/f32" } } ]
                },
                "(u8, bool)": {
                    "typeInfo": "Tuple",
                    "long_name": "(u8, bool)",
                    "prefixItems": [
                        { "type": { "$ref": "#/$defs/u8" } },
                        { "type": { "$ref": "#/$defs/bool" } }
                    ]
                },
                "bevy_utils::HashSet<u32>": {
                    "typeInfo": "Set",
                    "long_name": "bevy_utils::HashSet<u32>",
                    "items": { "type": { "$ref": "#/$defs/u32" } }
                },
                "game::Weapon": {
                    "typeInfo": "Enum",
                    "long_name": "game::Weapon",
                    "oneOf": [
                        "Fists",
                        {
                            "typeInfo": "Struct",
                            "long_name": "Sword",
                            "properties": { "damage": { "type": { "$ref": "#/$defs/f32" } } }
                        },
                        {
                            "typeInfo": "Tuple",
                            "long_name": "Bow",
                            "prefixItems": [ { "type": { "$ref": "#/$defs/u32" } } ]
                        }
                    ]
                },
                "glam::Vec2": { "typeInfo": "Value", "long_name": "glam::Vec2" },
                "game::Player": { "typeInfo": "UnitStruct", "long_name": "game::Player" },
                "f32": { "typeInfo": "Value", "long_name": "f32" },
                "u8": { "typeInfo": "Value", "long_name": "u8" },
                "u32": { "typeInfo": "Value", "long_name": "u32" },
                "bool": { "typeInfo": "Value", "long_name": "bool" }
            }}),
            primitives,
        )
        .unwrap();
        SchemaCompiler::new(&mut registry).compile_all();
        registry
    }

    fn instance(registry: &TypeRegistry, long_name: &str) -> GroupValue {
        let name = cforge_registry::GroupName::top_level(long_name);
        GroupValue::instantiate(&registry.cached_group(&name).unwrap())
    }

    #[test]
    fn struct_serializes_fields_and_omits_placeholders() {
        let registry = registry();
        let mut health = instance(&registry, "game::Health");
        health
            .set("game::Health", &"current".parse().unwrap(), json!(50))
            .unwrap();
        let json = ValueSerializer::new(&registry).serialize_component(&health).unwrap();
        assert_eq!(json, json!({ "current": 50.0, "max": 0.0 }));
    }

    #[test]
    fn newtype_and_tuple_shapes() {
        let registry = registry();
        let serializer = ValueSerializer::new(&registry);
        assert_eq!(
            serializer.serialize_component(&instance(&registry, "game::Speed")).unwrap(),
            json!(0.0)
        );
        assert_eq!(
            serializer.serialize_component(&instance(&registry, "(u8, bool)")).unwrap(),
            json!([0, false])
        );
    }

    #[test]
    fn set_serializes_distinct_items_in_first_occurrence_order() {
        let registry = registry();
        let mut set = instance(&registry, "bevy_utils::HashSet<u32>");
        let field: FieldPath = "set".parse().unwrap();
        for value in [3, 1, 3] {
            set.push_item("s", &field).unwrap();
            let index = match set.get("set") {
                Some(FieldValue::Collection(c)) => c.len() - 1,
                _ => unreachable!(),
            };
            set.set("s", &field.clone().index(index).field("value"), json!(value))
                .unwrap();
        }
        assert_eq!(
            ValueSerializer::new(&registry).serialize_component(&set).unwrap(),
            json!([3, 1])
        );
    }

    #[test]
    fn enum_variants_serialize_by_kind() {
        let registry = registry();
        let serializer = ValueSerializer::new(&registry);
        let mut weapon = instance(&registry, "game::Weapon");
        assert_eq!(serializer.serialize_component(&weapon).unwrap(), json!("Fists"));

        weapon.set("w", &"selection".parse().unwrap(), json!("Sword")).unwrap();
        weapon
            .set("w", &"variant_Sword.damage".parse().unwrap(), json!(7.5))
            .unwrap();
        assert_eq!(
            serializer.serialize_component(&weapon).unwrap(),
            json!({ "Sword": { "damage": 7.5 } })
        );

        weapon.set("w", &"selection".parse().unwrap(), json!("Bow")).unwrap();
        assert_eq!(serializer.serialize_component(&weapon).unwrap(), json!({ "Bow": 0 }));
    }

    #[test]
    fn value_and_unit_struct_shapes() {
        let registry = registry();
        let serializer = ValueSerializer::new(&registry);
        assert_eq!(
            serializer.serialize_component(&instance(&registry, "glam::Vec2")).unwrap(),
            json!([0.0, 0.0])
        );
        assert_eq!(
            serializer.serialize_component(&instance(&registry, "game::Player")).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let registry = registry();
        let speed = instance(&registry, "game::Speed");
        let health = registry.definition("game::Health").unwrap();
        assert!(matches!(
            ValueSerializer::new(&registry).serialize(&speed, &health),
            Err(SerializeError::ShapeMismatch { .. })
        ));
    }
}
