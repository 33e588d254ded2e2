use serde_json::Value as Json;

use crate::relation::{RelationId, RelationValue};
use crate::schema::{Attribute, SchemaRegistry, visit_data};

/// Collect every entry id referenced by the relation fields of a mutation
/// payload for the content type `uid`, recursing through components and
/// dynamic zones.
///
/// The result may contain duplicates and carries no ordering; it only seeds
/// the id lookup performed by [`resolve_entry_ids`](crate::relation::resolve_entry_ids).
/// Malformed relation values contribute no ids instead of failing.
pub fn extract_entry_ids(registry: &SchemaRegistry, uid: &str, data: &Json) -> Vec<RelationId> {
    let mut ids = Vec::new();
    let mut collect = |_: &str, attribute: &Attribute, value: &Json| {
        if attribute.as_relation().is_some() {
            RelationValue::from_json(value).collect_ids(&mut ids);
        }
    };
    visit_data(registry, uid, data, &mut collect);
    ids
}
