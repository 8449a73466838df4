//! # Primitive Tables
//!
//! Two host-supplied mappings keyed by primitive long name:
//!
//! - **defaults**: the JSON value a freshly created field starts with;
//! - **field kinds**: which editable widget represents the primitive, plus
//!   preset options (ranges, precision, ...) passed through to the host.
//!
//! A type counts as *primitive* when it has a default. Whether it can be
//! edited additionally depends on a field kind being registered for it.
//!
//! Tables can be built in code, taken from [`PrimitiveTable::builtin`], or
//! read from YAML/JSON:
//!
//! ```yaml
//! defaults:
//!   f32: 0.0
//! field_kinds:
//!   f32: { kind: float, presets: { step: 0.1 } }
//! ```

use std::cmp::Ordering;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};

use crate::error::RegistryError;

/// Preset holding a numeric field's inclusive lower bound.
pub const MIN_PRESET: &str = "min";
/// Preset holding a numeric field's inclusive upper bound.
pub const MAX_PRESET: &str = "max";

// 2^63 and 2^64, the first floats past the i64 and u64 ranges.
const I64_END: f64 = 9_223_372_036_854_775_808.0;
const U64_END: f64 = 18_446_744_073_709_551_616.0;

/// Editable-field kinds a host can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    Float,
    /// Free text.
    Text,
    /// A single character, stored as a string of length ≤ 1.
    Char,
    /// One of a fixed set of strings (enum variant selectors).
    Choice,
}

impl FieldKind {
    /// Whether `value` is acceptable for a field of this kind.
    ///
    /// Choice membership is checked by the caller, which owns the options.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64() || integral_float(value).is_some_and(|f| (-I64_END..I64_END).contains(&f)),
            Self::UInt => value.is_u64() || integral_float(value).is_some_and(|f| (0.0..U64_END).contains(&f)),
            Self::Float => value.is_number(),
            Self::Text | Self::Choice => value.is_string(),
            Self::Char => value.as_str().is_some_and(|s| s.chars().count() <= 1),
        }
    }

    /// Normalize `value` to the kind's native JSON representation.
    ///
    /// Floats become `f64` numbers and integral floats become integers for
    /// the integer kinds. Values the kind does not accept are returned
    /// unchanged.
    pub fn coerce(&self, value: &Value) -> Value {
        if !self.accepts(value) {
            return value.clone();
        }
        match self {
            Self::Float => value
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| value.clone()),
            Self::Int if !value.is_i64() => integral_float(value).map_or_else(|| value.clone(), |f| json!(f as i64)),
            Self::UInt if !value.is_u64() => integral_float(value).map_or_else(|| value.clone(), |f| json!(f as u64)),
            _ => value.clone(),
        }
    }
}

/// The value of a finite float JSON number with no fractional part.
fn integral_float(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .filter(|f| value.is_f64() && f.is_finite() && f.fract() == 0.0)
}

/// Order two JSON numbers, exactly when both are integers.
///
/// `None` when either side is not a number.
pub(crate) fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    let integer = |v: &Value| {
        v.as_i64()
            .map(i128::from)
            .or_else(|| v.as_u64().map(i128::from))
    };
    match (integer(a), integer(b)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Field kind plus preset options for one primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldKindSpec {
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub presets: Map<String, Value>,
}

impl FieldKindSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind, presets: Map::new() }
    }

    pub fn with_preset(mut self, key: &str, value: Value) -> Self {
        self.presets.insert(key.to_string(), value);
        self
    }
}

/// Defaults and field kinds for primitive types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveTable {
    #[serde(default)]
    defaults: IndexMap<String, Value>,
    #[serde(default)]
    field_kinds: IndexMap<String, FieldKindSpec>,
}

impl PrimitiveTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table covering Rust scalars and the common string types.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("bool", json!(false), FieldKindSpec::new(FieldKind::Bool));
        table.insert("char", json!(""), FieldKindSpec::new(FieldKind::Char));

        for name in ["f32", "f64"] {
            table.insert(name, json!(0.0), FieldKindSpec::new(FieldKind::Float));
        }

        let signed: [(&str, Option<(i64, i64)>); 6] = [
            ("i8", Some((i8::MIN as i64, i8::MAX as i64))),
            ("i16", Some((i16::MIN as i64, i16::MAX as i64))),
            ("i32", Some((i32::MIN as i64, i32::MAX as i64))),
            ("i64", None),
            ("i128", None),
            ("isize", None),
        ];
        for (name, range) in signed {
            let mut spec = FieldKindSpec::new(FieldKind::Int);
            if let Some((min, max)) = range {
                spec = spec.with_preset(MIN_PRESET, json!(min)).with_preset(MAX_PRESET, json!(max));
            }
            table.insert(name, json!(0), spec);
        }

        let unsigned: [(&str, Option<u64>); 6] = [
            ("u8", Some(u8::MAX as u64)),
            ("u16", Some(u16::MAX as u64)),
            ("u32", Some(u32::MAX as u64)),
            ("u64", None),
            ("u128", None),
            ("usize", None),
        ];
        for (name, max) in unsigned {
            let mut spec = FieldKindSpec::new(FieldKind::UInt).with_preset(MIN_PRESET, json!(0));
            if let Some(max) = max {
                spec = spec.with_preset(MAX_PRESET, json!(max));
            }
            table.insert(name, json!(0), spec);
        }

        for name in [
            "alloc::string::String",
            "alloc::borrow::Cow<str>",
            "std::path::PathBuf",
        ] {
            table.insert(name, json!(""), FieldKindSpec::new(FieldKind::Text));
        }
        table
    }

    /// Parse a table from YAML (or JSON, which YAML accepts).
    pub fn from_yaml_str(source: &str) -> Result<Self, RegistryError> {
        serde_yaml::from_str(source).map_err(|e| RegistryError::PrimitiveTable(e.to_string()))
    }

    /// Read a table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Register a primitive with both its default and its field kind.
    pub fn insert(&mut self, long_name: &str, default: Value, spec: FieldKindSpec) {
        self.defaults.insert(long_name.to_string(), default);
        self.field_kinds.insert(long_name.to_string(), spec);
    }

    /// Register a default only; the primitive will compile to a placeholder.
    pub fn insert_default(&mut self, long_name: &str, default: Value) {
        self.defaults.insert(long_name.to_string(), default);
    }

    /// Overlay `other` on top of this table.
    pub fn extend(&mut self, other: PrimitiveTable) {
        self.defaults.extend(other.defaults);
        self.field_kinds.extend(other.field_kinds);
    }

    pub fn is_primitive(&self, long_name: &str) -> bool {
        self.defaults.contains_key(long_name)
    }

    pub fn default_value(&self, long_name: &str) -> Option<&Value> {
        self.defaults.get(long_name)
    }

    pub fn field_kind(&self, long_name: &str) -> Option<&FieldKindSpec> {
        self.field_kinds.get(long_name)
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_scalars() {
        let table = PrimitiveTable::builtin();
        for name in ["bool", "f32", "i8", "u64", "alloc::string::String"] {
            assert!(table.is_primitive(name), "{name} should be primitive");
            assert!(table.field_kind(name).is_some(), "{name} should have a field kind");
        }
        assert_eq!(table.default_value("f32"), Some(&json!(0.0)));
        assert_eq!(
            table.field_kind("u8").unwrap().presets.get(MAX_PRESET),
            Some(&json!(255))
        );
    }

    #[test]
    fn yaml_table_parses() {
        let table = PrimitiveTable::from_yaml_str(
            "defaults:\n  f32: 1.5\n  game::Opaque: null\nfield_kinds:\n  f32: { kind: float, presets: { step: 0.1 } }\n",
        )
        .unwrap();
        assert_eq!(table.default_value("f32"), Some(&json!(1.5)));
        assert_eq!(table.field_kind("f32").unwrap().kind, FieldKind::Float);
        assert!(table.is_primitive("game::Opaque"));
        assert!(table.field_kind("game::Opaque").is_none());
    }

    #[test]
    fn bad_yaml_is_reported() {
        let err = PrimitiveTable::from_yaml_str("field_kinds:\n  f32: { kind: quaternion }\n")
            .unwrap_err();
        assert!(matches!(err, RegistryError::PrimitiveTable(_)));
    }

    #[test]
    fn kinds_accept_their_values() {
        assert!(FieldKind::Float.accepts(&json!(50)));
        assert!(FieldKind::Int.accepts(&json!(-3)));
        assert!(FieldKind::Int.accepts(&json!(4.0)));
        assert!(!FieldKind::Int.accepts(&json!(4.5)));
        assert!(!FieldKind::UInt.accepts(&json!(-1)));
        assert!(FieldKind::Char.accepts(&json!("x")));
        assert!(!FieldKind::Char.accepts(&json!("xy")));
        assert!(!FieldKind::Bool.accepts(&json!("true")));
    }

    #[test]
    fn integral_floats_outside_the_integer_range_are_rejected() {
        assert!(!FieldKind::Int.accepts(&json!(1e20)));
        assert!(!FieldKind::Int.accepts(&json!(-1e20)));
        assert!(FieldKind::Int.accepts(&json!(-9_223_372_036_854_775_808.0)));
        assert!(!FieldKind::UInt.accepts(&json!(1e20)));
        assert!(FieldKind::UInt.accepts(&json!(1e19)));
        assert_eq!(FieldKind::Int.coerce(&json!(1e20)), json!(1e20));
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(compare_numbers(&json!(300), &json!(255)), Some(Ordering::Greater));
        assert_eq!(compare_numbers(&json!(255.0), &json!(255)), Some(Ordering::Equal));
        assert_eq!(compare_numbers(&json!(-1), &json!(u64::MAX)), Some(Ordering::Less));
        assert_eq!(compare_numbers(&json!("1"), &json!(1)), None);
    }

    #[test]
    fn coerce_produces_native_representation() {
        assert_eq!(FieldKind::Float.coerce(&json!(50)), json!(50.0));
        assert_eq!(FieldKind::Int.coerce(&json!(7.0)), json!(7));
        assert_eq!(FieldKind::UInt.coerce(&json!(7.0)), json!(7));
        assert_eq!(FieldKind::Text.coerce(&json!("a")), json!("a"));
    }
}
