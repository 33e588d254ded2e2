use crate::schema::{Attribute, Attributes, SchemaRegistry};
use serde_json::Value as Json;

/// Visits every attribute value present in a data payload.
///
/// Implemented for any `FnMut(&str, &Attribute, &Json)` closure.
pub trait AttributeVisitor {
    /// Called once per (attribute, value) pair found in the payload
    fn visit(&mut self, name: &str, attribute: &Attribute, value: &Json);
}

impl<F> AttributeVisitor for F
where
    F: FnMut(&str, &Attribute, &Json),
{
    fn visit(&mut self, name: &str, attribute: &Attribute, value: &Json) {
        self(name, attribute, value)
    }
}

/// Walk a data payload guided by the schema of `uid`, calling the visitor for
/// every attribute a value is present for.
///
/// The walk recurses into component values (objects, or arrays of objects for
/// repeatable components) and into dynamic zone entries, which carry their
/// component uid in a `__component` field. Values without a matching schema
/// attribute, and attributes without a value, are skipped silently; a payload
/// that is not an object yields no visits.
pub fn visit_data<V>(registry: &SchemaRegistry, uid: &str, data: &Json, visitor: &mut V)
where
    V: AttributeVisitor,
{
    if let Some(attributes) = registry.attributes(uid) {
        walk_attributes(registry, attributes, data, visitor);
    }
}

fn walk_attributes<V>(registry: &SchemaRegistry, attributes: &Attributes, data: &Json, visitor: &mut V)
where
    V: AttributeVisitor,
{
    let Some(object) = data.as_object() else {
        return;
    };
    for (name, attribute) in attributes {
        let Some(value) = object.get(name) else {
            continue;
        };
        visitor.visit(name, attribute, value);
        match attribute {
            Attribute::Component(component) => {
                let Some(schema) = registry.component(&component.component) else {
                    continue;
                };
                if component.repeatable {
                    if let Some(items) = value.as_array() {
                        for item in items {
                            walk_attributes(registry, &schema.attributes, item, visitor);
                        }
                    }
                } else {
                    walk_attributes(registry, &schema.attributes, value, visitor);
                }
            }
            Attribute::DynamicZone(_) => {
                let Some(items) = value.as_array() else {
                    continue;
                };
                for item in items {
                    let Some(component_uid) = item.get("__component").and_then(Json::as_str) else {
                        continue;
                    };
                    let Some(schema) = registry.component(component_uid) else {
                        continue;
                    };
                    walk_attributes(registry, &schema.attributes, item, visitor);
                }
            }
            _ => {}
        }
    }
}
