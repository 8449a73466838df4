//! Value population: the inverse of serialization.
//!
//! Fills a fresh instance of a compiled group from stored component JSON,
//! so an item's existing data can be edited. Keys missing from the JSON
//! keep their defaults; unknown keys are ignored. Any shape mismatch fails
//! the whole population and the caller keeps a default instance.
//!
//! JSON under a placeholder field or a Value-kind group is kept verbatim so
//! the serializer can write it back untouched.

use std::sync::Arc;

use cforge_registry::{FieldSpec, GroupHandle, GroupShape, PrimitiveField, WRAPPER_VALUE_FIELD};
use serde_json::{json, Value};

use crate::error::SerializeError;
use crate::handlers::{collection_field, index_field, SELECTION_FIELD, VARIANT_PREFIX};
use crate::value::{FieldValue, GroupValue};

/// Build an instance of `handle` holding the data in `json`.
pub fn populate(handle: &GroupHandle, json: &Value) -> Result<GroupValue, SerializeError> {
    let mut value = GroupValue::instantiate(handle);
    fill_group(&mut value, json)?;
    Ok(value)
}

/// Like [`populate`], falling back to the default instance on mismatch.
pub fn populate_or_default(handle: &GroupHandle, json: &Value) -> GroupValue {
    populate(handle, json).unwrap_or_else(|error| {
        tracing::warn!(group = %handle.name, %error, "stored value does not fit; using defaults");
        GroupValue::instantiate(handle)
    })
}

fn fill_group(value: &mut GroupValue, json: &Value) -> Result<(), SerializeError> {
    let layout = Arc::clone(&value.handle().group);
    match layout.shape {
        GroupShape::Struct => {
            let object = json
                .as_object()
                .ok_or_else(|| mismatch(&layout.long_name, "object", json))?;
            for (name, spec) in &layout.fields {
                if let (Some(source), Some(slot)) = (object.get(name), value.fields.get_mut(name)) {
                    fill_field(&layout.long_name, spec, slot, source)?;
                }
            }
            Ok(())
        }
        GroupShape::Tuple | GroupShape::TupleStruct => {
            let slots: Vec<(&String, &FieldSpec)> = layout
                .fields
                .iter()
                .filter(|(name, _)| name.parse::<usize>().is_ok())
                .collect();
            if layout.shape == GroupShape::TupleStruct && slots.len() == 1 {
                let (name, spec) = slots[0];
                return match value.fields.get_mut(name) {
                    Some(slot) => fill_field(&layout.long_name, spec, slot, json),
                    None => Ok(()),
                };
            }
            let items = json
                .as_array()
                .filter(|items| items.len() == slots.len())
                .ok_or_else(|| mismatch(&layout.long_name, &format!("array of {}", slots.len()), json))?;
            for ((name, spec), source) in slots.into_iter().zip(items) {
                if let Some(slot) = value.fields.get_mut(name) {
                    fill_field(&layout.long_name, spec, slot, source)?;
                }
            }
            Ok(())
        }
        GroupShape::List | GroupShape::Set => {
            let field = collection_field(layout.shape).unwrap_or("list");
            let sources = json
                .as_array()
                .ok_or_else(|| mismatch(&layout.long_name, "array", json))?;
            let Some(FieldValue::Collection(collection)) = value.fields.get_mut(field) else {
                return Err(mismatch(&layout.long_name, "collection field", &Value::Null));
            };
            let mut items = Vec::with_capacity(sources.len());
            for source in sources {
                let mut item = GroupValue::instantiate(&collection.item);
                fill_group(&mut item, source)?;
                items.push(item);
            }
            collection.items = items;
            if let Some(slot) = value.fields.get_mut(&index_field(field)) {
                *slot = FieldValue::Primitive(json!(0));
            }
            Ok(())
        }
        GroupShape::Enum => fill_enum(value, &layout.long_name, json),
        GroupShape::Wrapper => match (layout.field(WRAPPER_VALUE_FIELD), value.fields.get_mut(WRAPPER_VALUE_FIELD)) {
            (Some(spec), Some(slot)) => fill_field(&layout.long_name, spec, slot, json),
            _ => Ok(()),
        },
        GroupShape::Value => {
            value.stored = Some(json.clone());
            Ok(())
        }
        GroupShape::UnitStruct => Ok(()),
    }
}

fn fill_enum(value: &mut GroupValue, long_name: &str, json: &Value) -> Result<(), SerializeError> {
    let (variant, payload) = match json {
        Value::String(name) => (name.as_str(), None),
        Value::Object(object) if object.len() == 1 => {
            let Some((name, payload)) = object.iter().next() else {
                return Err(mismatch(long_name, "variant", json));
            };
            (name.as_str(), Some(payload))
        }
        _ => return Err(mismatch(long_name, "variant name or single-key object", json)),
    };

    let layout = Arc::clone(&value.handle().group);
    let declared = matches!(
        layout.field(SELECTION_FIELD),
        Some(FieldSpec::Primitive(PrimitiveField { options, .. })) if options.iter().any(|o| o == variant)
    );
    if !declared {
        return Err(SerializeError::UnknownVariant {
            long_name: long_name.to_string(),
            variant: variant.to_string(),
        });
    }
    value
        .fields
        .insert(SELECTION_FIELD.to_string(), FieldValue::Primitive(json!(variant)));

    let Some(payload) = payload else {
        return Ok(());
    };
    match value.fields.get_mut(&format!("{VARIANT_PREFIX}{variant}")) {
        Some(FieldValue::Placeholder { stored, .. }) => {
            *stored = Some(payload.clone());
            Ok(())
        }
        Some(FieldValue::Group(group)) => {
            let single_slot_tuple = group.shape() == GroupShape::Tuple
                && group.fields().filter(|(name, _)| name.parse::<usize>().is_ok()).count() == 1;
            if single_slot_tuple {
                fill_group(group, &json!([payload]))
            } else {
                fill_group(group, payload)
            }
        }
        Some(_) => Err(SerializeError::MissingVariantData {
            long_name: long_name.to_string(),
            variant: variant.to_string(),
        }),
        None => Err(mismatch(long_name, &format!("unit variant '{variant}'"), json)),
    }
}

fn fill_field(
    owner: &str,
    spec: &FieldSpec,
    slot: &mut FieldValue,
    source: &Value,
) -> Result<(), SerializeError> {
    match (spec, slot) {
        (FieldSpec::Primitive(field), slot) => {
            if !field.accepts(source) {
                return Err(mismatch(owner, &format!("{:?} for '{}'", field.kind, field.label), source));
            }
            *slot = FieldValue::Primitive(field.kind.coerce(source));
            Ok(())
        }
        (FieldSpec::Nested(_), FieldValue::Group(group)) => fill_group(group, source),
        (FieldSpec::Placeholder { .. }, FieldValue::Placeholder { stored, .. }) => {
            *stored = Some(source.clone());
            Ok(())
        }
        _ => Ok(()),
    }
}

fn mismatch(long_name: &str, expected: &str, found: &Value) -> SerializeError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SerializeError::ShapeMismatch {
        long_name: long_name.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
