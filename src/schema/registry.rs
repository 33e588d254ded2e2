use crate::schema::Attribute;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The attributes of a content type or component, keyed by attribute name.
///
/// A [BTreeMap] keeps iteration order stable, so any SQL derived from a walk
/// over the attributes is deterministic.
pub type Attributes = BTreeMap<String, Attribute>;

/// A content type schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    /// Globally unique identifier, e.g. `api::article.article`
    pub uid: String,
    /// Name of the table holding this content type's entries
    pub collection_name: String,
    /// Whether entries exist in draft and published variants
    #[serde(default)]
    pub draft_and_publish: bool,
    /// The declared attributes
    #[serde(default)]
    pub attributes: Attributes,
}

/// A component schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Globally unique identifier, e.g. `shared.seo`
    pub uid: String,
    /// Name of the table holding this component's entries
    pub collection_name: String,
    /// The declared attributes
    #[serde(default)]
    pub attributes: Attributes,
}

/// Holds every known content type and component schema, keyed by uid.
///
/// The registry is the single source of truth consulted when traversing data
/// payloads and when scanning for relations during publish and discard flows.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    content_types: BTreeMap<String, ContentType>,
    components: BTreeMap<String, Component>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a content type schema to the registry, replacing any schema with the same uid
    pub fn register_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.content_types
            .insert(content_type.uid.clone(), content_type);
        self
    }

    /// Add a component schema to the registry, replacing any schema with the same uid
    pub fn register_component(&mut self, component: Component) -> &mut Self {
        self.components.insert(component.uid.clone(), component);
        self
    }

    /// Look up a content type by uid
    pub fn content_type(&self, uid: &str) -> Option<&ContentType> {
        self.content_types.get(uid)
    }

    /// Look up a component by uid
    pub fn component(&self, uid: &str) -> Option<&Component> {
        self.components.get(uid)
    }

    /// Get the attributes of a content type or component by uid
    pub fn attributes(&self, uid: &str) -> Option<&Attributes> {
        self.content_types
            .get(uid)
            .map(|content_type| &content_type.attributes)
            .or_else(|| self.components.get(uid).map(|component| &component.attributes))
    }

    /// Iterate over all registered content types in uid order
    pub fn content_types(&self) -> impl Iterator<Item = &ContentType> {
        self.content_types.values()
    }

    /// Iterate over all registered components in uid order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn content_type_from_json() {
        let content_type: ContentType = serde_json::from_value(json!({
            "uid": "api::article.article",
            "collectionName": "articles",
            "draftAndPublish": true,
            "attributes": {
                "title": { "type": "string" },
                "categories": {
                    "type": "relation",
                    "relation": "manyToMany",
                    "target": "api::category.category",
                    "inversedBy": "articles"
                }
            }
        }))
        .unwrap();

        assert_eq!(content_type.uid, "api::article.article");
        assert_eq!(content_type.collection_name, "articles");
        assert!(content_type.draft_and_publish);
        assert_eq!(content_type.attributes.len(), 2);
        assert_eq!(content_type.attributes["title"], Attribute::Scalar);
        assert!(content_type.attributes["categories"].as_relation().is_some());
    }

    #[test]
    fn registry_lookups() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_content_type(ContentType {
                uid: "api::article.article".to_owned(),
                collection_name: "articles".to_owned(),
                draft_and_publish: true,
                attributes: Attributes::new(),
            })
            .register_component(Component {
                uid: "shared.seo".to_owned(),
                collection_name: "components_shared_seos".to_owned(),
                attributes: Attributes::new(),
            });

        assert!(registry.content_type("api::article.article").is_some());
        assert!(registry.content_type("api::missing.missing").is_none());
        assert!(registry.component("shared.seo").is_some());
        assert!(registry.attributes("api::article.article").is_some());
        assert!(registry.attributes("shared.seo").is_some());
        assert!(registry.attributes("shared.missing").is_none());
        assert_eq!(registry.content_types().count(), 1);
        assert_eq!(registry.components().count(), 1);
    }
}
