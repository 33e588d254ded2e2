use std::fmt;

use sea_query::Value;
use serde_json::Value as Json;

/// Raw identifier carried by relation mutation payloads.
///
/// Numeric ids address entry rows directly; string ids are document ids that
/// still need resolving against an entry table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for RelationId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for RelationId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_owned())
    }
}

impl From<String> for RelationId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<&RelationId> for Value {
    fn from(id: &RelationId) -> Self {
        match id {
            RelationId::Int(id) => (*id).into(),
            RelationId::Str(id) => id.clone().into(),
        }
    }
}

impl From<RelationId> for Value {
    fn from(id: RelationId) -> Self {
        match id {
            RelationId::Int(id) => id.into(),
            RelationId::Str(id) => id.into(),
        }
    }
}

/// Placement directive a `connect` entry may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// Place directly before the anchor id
    Before(RelationId),
    /// Place directly after the anchor id
    After(RelationId),
    /// Place at the front
    Start,
    /// Place at the back
    End,
}

/// One `connect` entry: the id to link plus where to put it.
#[derive(Debug, Clone, PartialEq)]
pub struct Connect {
    pub id: RelationId,
    pub position: Option<Position>,
}

impl Connect {
    pub fn new<I>(id: I) -> Self
    where
        I: Into<RelationId>,
    {
        Self {
            id: id.into(),
            position: None,
        }
    }

    pub fn at<I>(id: I, position: Position) -> Self
    where
        I: Into<RelationId>,
    {
        Self {
            id: id.into(),
            position: Some(position),
        }
    }
}

/// The `set` / `connect` / `disconnect` longhand. The keys are independent
/// and any combination may be present at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationOps {
    pub set: Option<Vec<RelationId>>,
    pub connect: Vec<Connect>,
    pub disconnect: Vec<RelationId>,
}

/// A relation field's mutation payload, one variant per accepted shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    /// Explicit null, references nothing
    None,
    /// Bare id or `{id}` longhand
    One(RelationId),
    /// Array of bare ids or `{id}` objects, possibly mixed
    Many(Vec<RelationId>),
    /// `set` / `connect` / `disconnect` longhand
    Ops(RelationOps),
}

impl RelationValue {
    /// Read a relation mutation value out of raw JSON.
    ///
    /// This is a best-effort reading and never fails: unrecognized shapes
    /// fold into the nearest variant with whatever ids they do carry, and a
    /// value carrying none at all becomes [`RelationValue::None`].
    pub fn from_json(value: &Json) -> Self {
        match value {
            Json::Array(items) => Self::Many(ids_of_list(items)),
            Json::Object(map)
                if map.contains_key("set")
                    || map.contains_key("connect")
                    || map.contains_key("disconnect") =>
            {
                let mut ops = RelationOps::default();
                if let Some(set) = map.get("set") {
                    ops.set = Some(ids_of(set));
                }
                if let Some(connect) = map.get("connect") {
                    ops.connect = connects_of(connect);
                }
                if let Some(disconnect) = map.get("disconnect") {
                    ops.disconnect = ids_of(disconnect);
                }
                Self::Ops(ops)
            }
            other => match id_of(other) {
                Some(id) => Self::One(id),
                None => Self::None,
            },
        }
    }

    /// Every id this value references, position anchors included.
    ///
    /// Duplicates are kept; the list only seeds an id lookup downstream.
    pub fn referenced_ids(&self) -> Vec<RelationId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    pub(crate) fn collect_ids(&self, out: &mut Vec<RelationId>) {
        match self {
            Self::None => {}
            Self::One(id) => out.push(id.clone()),
            Self::Many(ids) => out.extend(ids.iter().cloned()),
            Self::Ops(ops) => {
                if let Some(set) = &ops.set {
                    out.extend(set.iter().cloned());
                }
                for connect in &ops.connect {
                    out.push(connect.id.clone());
                    match &connect.position {
                        Some(Position::Before(anchor)) | Some(Position::After(anchor)) => {
                            out.push(anchor.clone())
                        }
                        _ => {}
                    }
                }
                out.extend(ops.disconnect.iter().cloned());
            }
        }
    }
}

fn id_of(value: &Json) -> Option<RelationId> {
    match value {
        Json::Number(id) => id.as_i64().map(RelationId::Int),
        Json::String(id) => Some(RelationId::Str(id.clone())),
        Json::Object(map) => map.get("id").and_then(id_of),
        _ => None,
    }
}

fn ids_of(value: &Json) -> Vec<RelationId> {
    match value {
        Json::Array(items) => ids_of_list(items),
        other => id_of(other).into_iter().collect(),
    }
}

fn ids_of_list(items: &[Json]) -> Vec<RelationId> {
    items.iter().filter_map(id_of).collect()
}

fn connects_of(value: &Json) -> Vec<Connect> {
    let items: Vec<&Json> = match value {
        Json::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(|item| {
            let id = id_of(item)?;
            let position = match item {
                Json::Object(map) => map.get("position").and_then(position_of),
                _ => None,
            };
            Some(Connect { id, position })
        })
        .collect()
}

fn position_of(value: &Json) -> Option<Position> {
    let map = value.as_object()?;
    if let Some(anchor) = map.get("before").and_then(id_of) {
        return Some(Position::Before(anchor));
    }
    if let Some(anchor) = map.get("after").and_then(id_of) {
        return Some(Position::After(anchor));
    }
    if map.get("start").and_then(Json::as_bool) == Some(true) {
        return Some(Position::Start);
    }
    if map.get("end").and_then(Json::as_bool) == Some(true) {
        return Some(Position::End);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn shorthand_shapes() {
        assert_eq!(
            RelationValue::from_json(&json!(7)),
            RelationValue::One(RelationId::Int(7))
        );
        assert_eq!(
            RelationValue::from_json(&json!("doc-a")),
            RelationValue::One(RelationId::Str("doc-a".to_owned()))
        );
        assert_eq!(
            RelationValue::from_json(&json!({ "id": 7 })),
            RelationValue::One(RelationId::Int(7))
        );
        assert_eq!(
            RelationValue::from_json(&json!([1, { "id": 2 }, "doc-b"])),
            RelationValue::Many(vec![
                RelationId::Int(1),
                RelationId::Int(2),
                RelationId::Str("doc-b".to_owned()),
            ])
        );
    }

    #[test]
    fn unrecognized_shapes_reference_nothing() {
        assert_eq!(RelationValue::from_json(&json!(null)), RelationValue::None);
        assert_eq!(RelationValue::from_json(&json!(true)), RelationValue::None);
        assert_eq!(
            RelationValue::from_json(&json!({ "name": "not an id" })),
            RelationValue::None
        );
        assert_eq!(
            RelationValue::from_json(&json!([true, { "name": "x" }])),
            RelationValue::Many(vec![])
        );
    }

    #[test]
    fn longhand_keys_are_all_processed() {
        let value = RelationValue::from_json(&json!({
            "set": [1, 2, 3],
            "connect": [4, 5],
            "disconnect": [6, 7]
        }));
        let mut ids = value.referenced_ids();
        ids.sort();
        assert_eq!(
            ids,
            (1..=7).map(RelationId::Int).collect::<Vec<_>>()
        );
    }

    #[test]
    fn scalar_longhand_values_coerce_to_lists() {
        let value = RelationValue::from_json(&json!({
            "set": 8,
            "connect": 9,
            "disconnect": 10
        }));
        assert_eq!(
            value,
            RelationValue::Ops(RelationOps {
                set: Some(vec![RelationId::Int(8)]),
                connect: vec![Connect::new(9)],
                disconnect: vec![RelationId::Int(10)],
            })
        );
    }

    #[test]
    fn connect_positions_parse_in_all_forms() {
        let value = RelationValue::from_json(&json!({
            "connect": [
                { "id": 1, "position": { "before": 2 } },
                { "id": 3, "position": { "after": { "id": 4 } } },
                { "id": 5, "position": { "start": true } },
                { "id": 6, "position": { "end": true } },
                { "id": 7, "position": { "bogus": true } },
                8
            ]
        }));
        assert_eq!(
            value,
            RelationValue::Ops(RelationOps {
                set: None,
                connect: vec![
                    Connect::at(1, Position::Before(RelationId::Int(2))),
                    Connect::at(3, Position::After(RelationId::Int(4))),
                    Connect::at(5, Position::Start),
                    Connect::at(6, Position::End),
                    Connect::new(7),
                    Connect::new(8),
                ],
                disconnect: vec![],
            })
        );
    }

    #[test]
    fn referenced_ids_include_position_anchors() {
        let value = RelationValue::from_json(&json!({
            "connect": [{ "id": 1, "position": { "before": 2 } }]
        }));
        let mut ids = value.referenced_ids();
        ids.sort();
        assert_eq!(ids, [RelationId::Int(1), RelationId::Int(2)]);
    }
}
