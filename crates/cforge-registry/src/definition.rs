//! # Type Definitions
//!
//! A typed, read-only view over one entry of the reflection schema.
//!
//! Entries look like this (abridged):
//!
//! ```json
//! {
//!   "typeInfo": "Struct",
//!   "long_name": "game::Health",
//!   "short_name": "Health",
//!   "properties": {
//!     "current": { "type": { "$ref": "#/$defs/f32" } },
//!     "max":     { "type": { "$ref": "#/$defs/f32" } }
//!   },
//!   "isComponent": true
//! }
//! ```
//!
//! Deserialization is lenient: every field is optional so that a
//! definition missing its `long_name` or `typeInfo` can still be loaded and
//! then rejected as malformed at compile time, where the failure is
//! attributed to the component that referenced it.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CompileError;

/// Prefix of every intra-document `$ref`.
pub const DEFS_REF_PREFIX: &str = "#/$defs/";

/// Placeholder used in error messages when a definition has no name.
pub(crate) const UNNAMED: &str = "<unnamed>";

/// The closed vocabulary of `typeInfo` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Opaque primitive (`f32`, `String`, ...).
    Value,
    /// Named fields.
    Struct,
    /// Tagged variants.
    Enum,
    /// Anonymous positional slots.
    Tuple,
    /// Named type with positional slots.
    TupleStruct,
    /// Ordered homogeneous collection.
    List,
    /// Unordered homogeneous collection.
    Set,
    /// Fieldless marker type.
    UnitStruct,
}

impl TypeKind {
    /// The tag as it appears in the schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Struct => "Struct",
            Self::Enum => "Enum",
            Self::Tuple => "Tuple",
            Self::TupleStruct => "TupleStruct",
            Self::List => "List",
            Self::Set => "Set",
            Self::UnitStruct => "UnitStruct",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Value" => Ok(Self::Value),
            "Struct" => Ok(Self::Struct),
            "Enum" => Ok(Self::Enum),
            "Tuple" => Ok(Self::Tuple),
            "TupleStruct" => Ok(Self::TupleStruct),
            "List" => Ok(Self::List),
            "Set" => Ok(Self::Set),
            "UnitStruct" => Ok(Self::UnitStruct),
            other => Err(format!("unknown typeInfo '{other}'")),
        }
    }
}

/// One schema entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Globally unique identifier, e.g. `alloc::vec::Vec<alloc::string::String>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Unparsed kind tag; see [`TypeDefinition::kind`].
    #[serde(rename = "typeInfo", default, skip_serializing_if = "Option::is_none")]
    pub type_info: Option<String>,

    /// Struct fields in declaration order, each `{ "type": { "$ref": ... } }`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,

    /// Tuple slots in order.
    #[serde(rename = "prefixItems", default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<Value>,

    /// Collection item schema. Tuples carry `"items": false` here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,

    /// Enum variants.
    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Value>,

    /// Alternative variant title used by some exporters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Attachable to entities; listed by `cforge defaults`.
    #[serde(rename = "isComponent", default)]
    pub is_component: bool,

    #[serde(rename = "isResource", default)]
    pub is_resource: bool,
}

/// An enum variant, parsed from a `oneOf` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantDefinition {
    /// No payload. Serialized as the bare variant name.
    Unit(String),
    /// Struct- or tuple-shaped payload described by `definition`.
    Data {
        name: String,
        definition: TypeDefinition,
    },
}

impl VariantDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Unit(name) => name,
            Self::Data { name, .. } => name,
        }
    }
}

impl TypeDefinition {
    /// Parse a raw schema entry.
    ///
    /// Only fails when the entry is not a JSON object or a known key has the
    /// wrong JSON type.
    pub fn from_value(value: &Value) -> Result<Self, CompileError> {
        if !value.is_object() {
            return Err(CompileError::malformed(UNNAMED, "definition is not an object"));
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            let name = value
                .get("long_name")
                .and_then(Value::as_str)
                .unwrap_or(UNNAMED);
            CompileError::malformed(name, e.to_string())
        })
    }

    /// The definition's long name.
    pub fn long_name(&self) -> Result<&str, CompileError> {
        self.long_name
            .as_deref()
            .ok_or_else(|| CompileError::malformed(UNNAMED, "missing 'long_name'"))
    }

    /// Long name for messages; never fails.
    pub fn display_name(&self) -> &str {
        self.long_name.as_deref().unwrap_or(UNNAMED)
    }

    /// Decoded kind tag.
    pub fn kind(&self) -> Result<TypeKind, CompileError> {
        let tag = self
            .type_info
            .as_deref()
            .ok_or_else(|| CompileError::malformed(self.display_name(), "missing 'typeInfo'"))?;
        tag.parse()
            .map_err(|reason: String| CompileError::malformed(self.display_name(), reason))
    }

    /// `(property name, $ref)` pairs in declaration order.
    ///
    /// A property without a `type.$ref` yields `None` for its reference.
    pub fn property_refs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.properties
            .iter()
            .map(|(name, schema)| (name.as_str(), type_ref(schema)))
    }

    /// `$ref` of each tuple slot, in order.
    pub fn slot_refs(&self) -> Vec<Option<&str>> {
        self.prefix_items.iter().map(type_ref).collect()
    }

    /// `items.type.$ref`, when present.
    pub fn item_ref(&self) -> Option<&str> {
        self.items.as_ref().and_then(type_ref)
    }

    /// Parse the `oneOf` list into variants.
    ///
    /// Entries that are neither a string nor a named object are skipped with
    /// a warning; an enum with no usable variant is malformed.
    pub fn variants(&self) -> Result<Vec<VariantDefinition>, CompileError> {
        let mut variants = Vec::with_capacity(self.one_of.len());
        for entry in &self.one_of {
            match parse_variant(entry) {
                Some(variant) => variants.push(variant),
                None => tracing::warn!(
                    long_name = self.display_name(),
                    entry = %entry,
                    "skipping unrecognized enum variant"
                ),
            }
        }
        if variants.is_empty() {
            return Err(CompileError::malformed(self.display_name(), "enum has no variants"));
        }
        Ok(variants)
    }

    /// Copy of this definition under another long name.
    ///
    /// Used to give enum variant payloads an identity that cannot collide
    /// with a real schema type.
    pub fn renamed(&self, long_name: impl Into<String>) -> Self {
        Self {
            long_name: Some(long_name.into()),
            ..self.clone()
        }
    }
}

/// Extract `type.$ref` from a property / slot / items schema.
pub fn type_ref(schema: &Value) -> Option<&str> {
    schema.get("type")?.get("$ref")?.as_str()
}

fn parse_variant(entry: &Value) -> Option<VariantDefinition> {
    if let Some(name) = entry.as_str() {
        return Some(VariantDefinition::Unit(name.to_string()));
    }
    let definition = TypeDefinition::from_value(entry).ok()?;
    let name = definition
        .long_name
        .clone()
        .or_else(|| definition.title.clone())
        .or_else(|| definition.short_name.clone())?;
    match definition.kind() {
        Ok(TypeKind::Struct | TypeKind::Tuple | TypeKind::TupleStruct) => {
            Some(VariantDefinition::Data { name, definition })
        }
        _ => Some(VariantDefinition::Unit(name)),
    }
}
