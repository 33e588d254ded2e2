use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// A single attribute in a content type or component schema.
///
/// Only the attribute families that influence relation handling are modelled
/// in full; every other attribute type collapses into [Attribute::Scalar].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Attribute {
    /// A relation to another content type
    Relation(RelationAttr),
    /// A nested component, possibly repeatable
    Component(ComponentAttr),
    /// A dynamic zone holding a heterogeneous list of components
    #[serde(rename = "dynamiczone")]
    DynamicZone(DynamicZoneAttr),
    /// Any scalar attribute (string, number, date, ...)
    #[serde(other)]
    Scalar,
}

/// The kind of a relation attribute
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    MorphOne,
    MorphMany,
    MorphToOne,
    MorphToMany,
}

/// A relation attribute as declared in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAttr {
    /// The relation kind
    pub relation: RelationKind,
    /// Uid of the related content type; morph relations have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Name of the attribute on the target owning the relation, if this side owns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversed_by: Option<String>,
    /// Name of the owning attribute on the target, if this is the inverse side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<String>,
    /// The join table backing this relation, if it joins through one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_table: Option<JoinTable>,
}

/// Describes the join table backing a relation.
///
/// `source_column` holds the id of the entry owning the relation and
/// `target_column` the id of the related entry. The optional order columns
/// store the position of the related entry as seen from either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTable {
    /// Table name
    pub name: String,
    /// Column referencing the owning entry
    pub source_column: String,
    /// Column referencing the related entry
    pub target_column: String,
    /// Ordering of related entries as seen from the owning side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_column: Option<String>,
    /// Ordering of owning entries as seen from the related side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_order_column: Option<String>,
}

/// A component attribute as declared in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAttr {
    /// Uid of the component schema
    pub component: String,
    /// Whether the attribute holds a list of component values
    #[serde(default)]
    pub repeatable: bool,
}

/// A dynamic zone attribute as declared in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicZoneAttr {
    /// Uids of the component schemas allowed in this zone
    pub components: Vec<String>,
}

impl Attribute {
    /// Get the relation declaration, if this attribute is a relation
    pub fn as_relation(&self) -> Option<&RelationAttr> {
        match self {
            Attribute::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

impl RelationAttr {
    /// A relation is bidirectional when either side names the other
    pub fn is_bidirectional(&self) -> bool {
        self.inversed_by.is_some() || self.mapped_by.is_some()
    }

    /// Whether this relation points at the given content type
    pub fn targets(&self, uid: &str) -> bool {
        self.target.as_deref() == Some(uid)
    }

    /// Morph relations join through a polymorphic table and carry no fixed target
    pub fn is_morph(&self) -> bool {
        matches!(
            self.relation,
            RelationKind::MorphOne
                | RelationKind::MorphMany
                | RelationKind::MorphToOne
                | RelationKind::MorphToMany
        )
    }
}
