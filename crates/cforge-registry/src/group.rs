//! # Compiled Field Groups
//!
//! The compiler's output: a closed tree of field groups. Each group is
//! tagged with the long name it was compiled from and a [`GroupShape`], and
//! maps field names (in declaration order) to a [`FieldSpec`].
//!
//! Groups are registered in the [`TypeRegistry`](crate::TypeRegistry)
//! cache under a [`GroupName`] derived from the nesting path, and shared
//! through [`GroupHandle`]s.
//!
//! ## Naming
//!
//! | compile                 | name                          |
//! |-------------------------|-------------------------------|
//! | top-level component     | `game::Health`                |
//! | nested under a path     | `Player/stats/game::Stats`    |
//! | primitive wrapper       | `Player/tags/wrapper_f32`     |

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::definition::TypeKind;
use crate::primitives::{compare_numbers, FieldKind, MAX_PRESET, MIN_PRESET};

/// Field name of the single leaf inside Value groups and empty structs.
pub const PLACEHOLDER_FIELD: &str = "placeholder";
/// Marker field of UnitStruct groups.
pub const UNIT_STRUCT_FIELD: &str = "unit_struct_placeholder";
/// Field name inside a wrapper group.
pub const WRAPPER_VALUE_FIELD: &str = "value";
/// Prefix of wrapper group names.
pub const WRAPPER_PREFIX: &str = "wrapper_";

/// Names from the root component down to the field being compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NestingPath(Vec<String>);

impl NestingPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// A path holding only the top-level component name.
    pub fn for_component(component: impl Into<String>) -> Self {
        Self(vec![component.into()])
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The top-level component this path belongs to.
    pub fn root(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NestingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Unique registration name of a compiled group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    /// Name of a top-level, non-nested compile: the bare long name.
    pub fn top_level(long_name: &str) -> Self {
        Self(long_name.to_string())
    }

    /// Name of a group compiled beneath `path`.
    pub fn nested(path: &NestingPath, long_name: &str) -> Self {
        if path.is_empty() {
            return Self::top_level(long_name);
        }
        Self(format!("{path}/{long_name}"))
    }

    /// Name of the wrapper for `item` beneath `path`.
    pub fn wrapper(path: &NestingPath, item: &str) -> Self {
        Self::nested(path, &format!("{WRAPPER_PREFIX}{item}"))
    }

    /// Pick the naming rule for a compile.
    pub fn for_compile(nested: bool, path: &NestingPath, long_name: &str) -> Self {
        if nested {
            Self::nested(path, long_name)
        } else {
            Self::top_level(long_name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of group shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupShape {
    Struct,
    Enum,
    Tuple,
    TupleStruct,
    List,
    Set,
    UnitStruct,
    Value,
    /// Synthetic single-field group around a primitive collection item.
    Wrapper,
}

impl From<TypeKind> for GroupShape {
    fn from(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Value => Self::Value,
            TypeKind::Struct => Self::Struct,
            TypeKind::Enum => Self::Enum,
            TypeKind::Tuple => Self::Tuple,
            TypeKind::TupleStruct => Self::TupleStruct,
            TypeKind::List => Self::List,
            TypeKind::Set => Self::Set,
            TypeKind::UnitStruct => Self::UnitStruct,
        }
    }
}

impl fmt::Display for GroupShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Struct => "Struct",
            Self::Enum => "Enum",
            Self::Tuple => "Tuple",
            Self::TupleStruct => "TupleStruct",
            Self::List => "List",
            Self::Set => "Set",
            Self::UnitStruct => "UnitStruct",
            Self::Value => "Value",
            Self::Wrapper => "Wrapper",
        };
        f.write_str(label)
    }
}

/// An editable leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveField {
    pub label: String,
    pub kind: FieldKind,
    pub default: Value,
    /// Host presets (ranges, steps, ...), passed through untouched.
    pub presets: Map<String, Value>,
    /// Allowed values of a [`FieldKind::Choice`] field.
    pub options: Vec<String>,
    /// Whether editing the field emits a change event.
    pub notifies: bool,
}

impl PrimitiveField {
    pub fn new(label: impl Into<String>, kind: FieldKind, default: Value) -> Self {
        Self {
            label: label.into(),
            kind,
            default,
            presets: Map::new(),
            options: Vec::new(),
            notifies: true,
        }
    }

    /// A choice field over `options`, defaulting to the first one.
    pub fn choice(label: impl Into<String>, options: Vec<String>) -> Self {
        let default = options.first().cloned().map_or(Value::Null, Value::String);
        Self {
            options,
            ..Self::new(label, FieldKind::Choice, default)
        }
    }

    pub fn with_presets(mut self, presets: Map<String, Value>) -> Self {
        self.presets = presets;
        self
    }

    pub fn silent(mut self) -> Self {
        self.notifies = false;
        self
    }

    /// Whether `value` is a legal value for this field.
    ///
    /// Numbers must also lie within the `min`/`max` presets when present.
    pub fn accepts(&self, value: &Value) -> bool {
        if !self.kind.accepts(value) {
            return false;
        }
        match self.kind {
            FieldKind::Choice => value
                .as_str()
                .is_some_and(|s| self.options.iter().any(|o| o == s)),
            FieldKind::Int | FieldKind::UInt | FieldKind::Float => self.within_bounds(value),
            _ => true,
        }
    }

    fn within_bounds(&self, value: &Value) -> bool {
        let below_min = self
            .presets
            .get(MIN_PRESET)
            .and_then(|min| compare_numbers(value, min))
            .is_some_and(|o| o == Ordering::Less);
        let above_max = self
            .presets
            .get(MAX_PRESET)
            .and_then(|max| compare_numbers(value, max))
            .is_some_and(|o| o == Ordering::Greater);
        !below_min && !above_max
    }
}

/// One field of a compiled group.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    Primitive(PrimitiveField),
    /// A non-editable label standing in for something that could not, or
    /// need not, be compiled.
    Placeholder { label: String, text: String },
    /// A nested group instance.
    Nested(GroupHandle),
    /// A homogeneous collection of instances of the item group.
    Collection(GroupHandle),
}

impl FieldSpec {
    pub fn placeholder(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Placeholder {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Shared reference to a registered group.
#[derive(Debug, Clone)]
pub struct GroupHandle {
    pub name: GroupName,
    pub group: Arc<CompiledFieldGroup>,
}

impl GroupHandle {
    pub fn new(name: GroupName, group: Arc<CompiledFieldGroup>) -> Self {
        Self { name, group }
    }
}

impl PartialEq for GroupHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.group, &other.group)
    }
}

/// The compiled form of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFieldGroup {
    /// Long name of the originating type; the item type for wrappers.
    pub long_name: String,
    pub shape: GroupShape,
    pub fields: IndexMap<String, FieldSpec>,
}

impl CompiledFieldGroup {
    pub fn new(long_name: impl Into<String>, shape: GroupShape) -> Self {
        Self {
            long_name: long_name.into(),
            shape,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        self.fields.insert(name.into(), spec);
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
