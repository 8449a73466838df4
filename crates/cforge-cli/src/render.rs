//! Plain-text rendering of compiled group trees.

use cforge_registry::{FieldSpec, GroupHandle};

const INDENT: &str = "  ";

/// Render `handle` and everything beneath it, one field per line.
pub fn render_group(handle: &GroupHandle) -> String {
    let mut out = format!("{} [{}]\n", handle.name, handle.group.shape);
    render_fields(&mut out, handle, 1);
    out
}

fn render_fields(out: &mut String, handle: &GroupHandle, depth: usize) {
    let indent = INDENT.repeat(depth);
    for (name, spec) in &handle.group.fields {
        match spec {
            FieldSpec::Primitive(field) => {
                out.push_str(&format!("{indent}{name}: {:?} = {}\n", field.kind, field.default));
            }
            FieldSpec::Placeholder { text, .. } => {
                out.push_str(&format!("{indent}{name}: <{text}>\n"));
            }
            FieldSpec::Nested(child) => {
                out.push_str(&format!("{indent}{name}: {} [{}]\n", child.group.long_name, child.group.shape));
                render_fields(out, child, depth + 1);
            }
            FieldSpec::Collection(item) => {
                out.push_str(&format!("{indent}{name}: [{} ...] ({})\n", item.group.long_name, item.group.shape));
                render_fields(out, item, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cforge_registry::{
        CompiledFieldGroup, FieldKind, GroupName, GroupShape, PrimitiveField,
    };
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_nested_fields_indented() {
        let inner = GroupHandle::new(
            GroupName::top_level("Health/stats/game::Stats"),
            Arc::new(
                CompiledFieldGroup::new("game::Stats", GroupShape::Struct).with_field(
                    "level",
                    FieldSpec::Primitive(PrimitiveField::new("level", FieldKind::UInt, json!(0))),
                ),
            ),
        );
        let outer = GroupHandle::new(
            GroupName::top_level("Health"),
            Arc::new(
                CompiledFieldGroup::new("Health", GroupShape::Struct)
                    .with_field("stats", FieldSpec::Nested(inner))
                    .with_field("ghost", FieldSpec::placeholder("ghost", "Struct N/A")),
            ),
        );
        assert_eq!(
            render_group(&outer),
            "Health [Struct]\n  stats: game::Stats [Struct]\n    level: UInt = 0\n  ghost: <Struct N/A>\n"
        );
    }
}
