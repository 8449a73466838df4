//! # Value Trees
//!
//! Instances of compiled field groups: what a host binds to an item and
//! what the user edits.
//!
//! ## Addressing
//!
//! Leaves are addressed by a [`FieldPath`] written in dotted form with
//! bracketed collection indices:
//!
//! ```text
//! current
//! 0.list[1].value
//! variant_Sword.damage
//! ```
//!
//! ## Change Events
//!
//! Editing a leaf whose field spec `notifies`, or pushing/removing a
//! collection item, yields a [`FieldChanged`] naming the top-level
//! component and the path. The host routes every such event to the single
//! [`EditDispatcher`](crate::EditDispatcher).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cforge_registry::{CompiledFieldGroup, FieldSpec, GroupHandle, GroupShape};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::EditError;
use crate::handlers::index_field;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a field inside a value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Field(name.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final field name and the segments leading to its group.
    fn split_leaf(&self) -> Result<(&str, &[PathSegment]), EditError> {
        match self.0.split_last() {
            Some((PathSegment::Field(name), parent)) => Ok((name, parent)),
            Some((PathSegment::Index(_), _)) => Err(self.invalid("path must end in a field name")),
            None => Err(self.invalid("empty path")),
        }
    }

    fn invalid(&self, reason: &str) -> EditError {
        EditError::InvalidPath {
            path: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EditError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        if s.trim().is_empty() {
            return Err(invalid("empty path"));
        }
        let mut segments = Vec::new();
        for token in s.split('.') {
            let (name, mut rest) = match token.find('[') {
                Some(open) => (&token[..open], &token[open..]),
                None => (token, ""),
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("empty field name"));
            }
            segments.push(PathSegment::Field(name.to_string()));
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let inner = rest
                    .strip_prefix('[')
                    .map(|r| &r[..close - 1])
                    .ok_or_else(|| invalid("unexpected text after index"))?;
                let index = inner
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid("index is not a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
            }
        }
        Ok(Self(segments))
    }
}

/// Emitted when a notifying field of a top-level component changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChanged {
    pub component: String,
    pub path: FieldPath,
}

impl fmt::Display for FieldChanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component, self.path)
    }
}

/// The current value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Primitive(Value),
    /// A field the compiler could not model. `stored` keeps the JSON read
    /// from the component store so it is written back unchanged.
    Placeholder { text: String, stored: Option<Value> },
    Group(GroupValue),
    Collection(CollectionValue),
}

impl FieldValue {
    fn default_for(spec: &FieldSpec) -> Self {
        match spec {
            FieldSpec::Primitive(field) => Self::Primitive(field.default.clone()),
            FieldSpec::Placeholder { text, .. } => Self::Placeholder {
                text: text.clone(),
                stored: None,
            },
            FieldSpec::Nested(handle) => Self::Group(GroupValue::instantiate(handle)),
            FieldSpec::Collection(item) => Self::Collection(CollectionValue {
                item: item.clone(),
                items: Vec::new(),
            }),
        }
    }
}

/// Items of a List or Set field, all instances of `item`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionValue {
    pub item: GroupHandle,
    pub items: Vec<GroupValue>,
}

impl CollectionValue {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An instance of a compiled field group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupValue {
    handle: GroupHandle,
    pub(crate) fields: IndexMap<String, FieldValue>,
    /// Stored JSON of a Value-kind group, which has no editable fields.
    pub(crate) stored: Option<Value>,
}

impl GroupValue {
    /// A fresh instance holding every field's default.
    pub fn instantiate(handle: &GroupHandle) -> Self {
        let fields = handle
            .group
            .fields
            .iter()
            .map(|(name, spec)| (name.clone(), FieldValue::default_for(spec)))
            .collect();
        Self {
            handle: handle.clone(),
            fields,
            stored: None,
        }
    }

    pub fn handle(&self) -> &GroupHandle {
        &self.handle
    }

    pub fn layout(&self) -> &CompiledFieldGroup {
        &self.handle.group
    }

    pub fn long_name(&self) -> &str {
        &self.handle.group.long_name
    }

    pub fn shape(&self) -> GroupShape {
        self.handle.group.shape
    }

    /// Opaque JSON carried over from the component store, if any.
    pub fn stored(&self) -> Option<&Value> {
        self.stored.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The primitive value of `field`, if it is a primitive.
    pub fn primitive(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            Some(FieldValue::Primitive(value)) => Some(value),
            _ => None,
        }
    }

    /// Look up the field at `path`.
    pub fn resolve(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.lookup(path.segments())
    }

    fn lookup(&self, segments: &[PathSegment]) -> Option<&FieldValue> {
        let (PathSegment::Field(name), rest) = segments.split_first()? else {
            return None;
        };
        let value = self.fields.get(name)?;
        if rest.is_empty() {
            return Some(value);
        }
        match value {
            FieldValue::Group(group) => group.lookup(rest),
            FieldValue::Collection(collection) => {
                let (PathSegment::Index(index), rest) = rest.split_first()? else {
                    return None;
                };
                collection.items.get(*index)?.lookup(rest)
            }
            _ => None,
        }
    }

    fn group_at_mut(
        &mut self,
        segments: &[PathSegment],
        full: &FieldPath,
    ) -> Result<&mut GroupValue, EditError> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(self);
        };
        let PathSegment::Field(name) = first else {
            return Err(full.invalid("index without a collection field"));
        };
        let value = self.fields.get_mut(name).ok_or_else(|| EditError::NoSuchField {
            path: full.to_string(),
            field: name.clone(),
        })?;
        match value {
            FieldValue::Group(group) => group.group_at_mut(rest, full),
            FieldValue::Collection(collection) => {
                let Some((PathSegment::Index(index), rest)) = rest.split_first() else {
                    return Err(full.invalid("collection field must be followed by an index"));
                };
                let len = collection.items.len();
                let item = collection
                    .items
                    .get_mut(*index)
                    .ok_or_else(|| EditError::IndexOutOfRange {
                        path: full.to_string(),
                        index: *index,
                        len,
                    })?;
                item.group_at_mut(rest, full)
            }
            FieldValue::Primitive(_) | FieldValue::Placeholder { .. } => Err(EditError::NotEditable {
                path: full.to_string(),
            }),
        }
    }

    /// Assign `value` to the primitive leaf at `path`.
    ///
    /// Returns the change event when the field notifies.
    pub fn set(
        &mut self,
        component: &str,
        path: &FieldPath,
        value: Value,
    ) -> Result<Option<FieldChanged>, EditError> {
        let (leaf, parent) = path.split_leaf()?;
        let group = self.group_at_mut(parent, path)?;
        let layout = Arc::clone(&group.handle.group);
        let spec = layout.field(leaf).ok_or_else(|| EditError::NoSuchField {
            path: path.to_string(),
            field: leaf.to_string(),
        })?;
        let FieldSpec::Primitive(field) = spec else {
            return Err(EditError::NotEditable {
                path: path.to_string(),
            });
        };
        if !field.accepts(&value) {
            return Err(EditError::TypeMismatch {
                path: path.to_string(),
                expected: field.kind,
                value: value.to_string(),
            });
        }
        group
            .fields
            .insert(leaf.to_string(), FieldValue::Primitive(field.kind.coerce(&value)));
        tracing::trace!(component, path = %path, "field set");
        Ok(field.notifies.then(|| FieldChanged {
            component: component.to_string(),
            path: path.clone(),
        }))
    }

    /// Append a default item to the collection at `path` and select it.
    pub fn push_item(&mut self, component: &str, path: &FieldPath) -> Result<FieldChanged, EditError> {
        let (leaf, parent) = path.split_leaf()?;
        let group = self.group_at_mut(parent, path)?;
        let index = match group.fields.get_mut(leaf) {
            Some(FieldValue::Collection(collection)) => {
                collection.items.push(GroupValue::instantiate(&collection.item));
                collection.items.len() - 1
            }
            Some(_) => return Err(EditError::NotACollection { path: path.to_string() }),
            None => {
                return Err(EditError::NoSuchField {
                    path: path.to_string(),
                    field: leaf.to_string(),
                })
            }
        };
        group.select(leaf, index);
        Ok(FieldChanged {
            component: component.to_string(),
            path: path.clone(),
        })
    }

    /// Remove item `index` from the collection at `path`.
    pub fn remove_item(
        &mut self,
        component: &str,
        path: &FieldPath,
        index: usize,
    ) -> Result<FieldChanged, EditError> {
        let (leaf, parent) = path.split_leaf()?;
        let group = self.group_at_mut(parent, path)?;
        let remaining = match group.fields.get_mut(leaf) {
            Some(FieldValue::Collection(collection)) => {
                if index >= collection.items.len() {
                    return Err(EditError::IndexOutOfRange {
                        path: path.to_string(),
                        index,
                        len: collection.items.len(),
                    });
                }
                collection.items.remove(index);
                collection.items.len()
            }
            Some(_) => return Err(EditError::NotACollection { path: path.to_string() }),
            None => {
                return Err(EditError::NoSuchField {
                    path: path.to_string(),
                    field: leaf.to_string(),
                })
            }
        };
        group.select(leaf, index.min(remaining.saturating_sub(1)));
        Ok(FieldChanged {
            component: component.to_string(),
            path: path.clone(),
        })
    }

    fn select(&mut self, collection_field: &str, index: usize) {
        if let Some(slot) = self.fields.get_mut(&index_field(collection_field)) {
            *slot = FieldValue::Primitive(json!(index));
        }
    }
}
