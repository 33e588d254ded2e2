//! Schema fixtures for test cases. Not intended for actual use.

use crate::schema::{
    Attribute, Attributes, Component, ComponentAttr, ContentType, DynamicZoneAttr, JoinTable,
    RelationAttr, RelationKind, SchemaRegistry,
};

fn join_table(
    name: &str,
    source_column: &str,
    target_column: &str,
    order_column: Option<&str>,
    inverse_order_column: Option<&str>,
) -> JoinTable {
    JoinTable {
        name: name.to_owned(),
        source_column: source_column.to_owned(),
        target_column: target_column.to_owned(),
        order_column: order_column.map(str::to_owned),
        inverse_order_column: inverse_order_column.map(str::to_owned),
    }
}

fn relation(
    kind: RelationKind,
    target: Option<&str>,
    inversed_by: Option<&str>,
    mapped_by: Option<&str>,
    join_table: Option<JoinTable>,
) -> Attribute {
    Attribute::Relation(RelationAttr {
        relation: kind,
        target: target.map(str::to_owned),
        inversed_by: inversed_by.map(str::to_owned),
        mapped_by: mapped_by.map(str::to_owned),
        join_table,
    })
}

/// A registry wired like a small blog: articles relate to categories, tags,
/// a writer and themselves, and embed further relations through a component
/// and a dynamic zone. Each bidirectional relation is registered on both
/// sides with the join table described from that side's point of view, so
/// `target_column` always names the foreign key of the attribute's target.
pub fn blog_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    registry.register_content_type(ContentType {
        uid: "api::article.article".to_owned(),
        collection_name: "articles".to_owned(),
        draft_and_publish: true,
        attributes: Attributes::from([
            ("title".to_owned(), Attribute::Scalar),
            (
                "categories".to_owned(),
                relation(
                    RelationKind::ManyToMany,
                    Some("api::category.category"),
                    Some("articles"),
                    None,
                    Some(join_table(
                        "articles_categories_lnk",
                        "article_id",
                        "category_id",
                        Some("category_ord"),
                        Some("article_ord"),
                    )),
                ),
            ),
            (
                "tags".to_owned(),
                relation(
                    RelationKind::ManyToMany,
                    Some("api::tag.tag"),
                    Some("articles"),
                    None,
                    Some(join_table(
                        "articles_tags_lnk",
                        "article_id",
                        "tag_id",
                        Some("tag_ord"),
                        Some("article_ord"),
                    )),
                ),
            ),
            (
                "author".to_owned(),
                relation(
                    RelationKind::ManyToOne,
                    Some("api::writer.writer"),
                    Some("articles"),
                    None,
                    Some(join_table(
                        "articles_author_lnk",
                        "article_id",
                        "author_id",
                        None,
                        Some("article_ord"),
                    )),
                ),
            ),
            (
                "related_articles".to_owned(),
                relation(
                    RelationKind::ManyToMany,
                    Some("api::article.article"),
                    Some("related_articles"),
                    None,
                    Some(join_table(
                        "articles_related_articles_lnk",
                        "article_id",
                        "inv_article_id",
                        Some("article_ord"),
                        Some("inv_article_ord"),
                    )),
                ),
            ),
            (
                "hero_image".to_owned(),
                relation(
                    RelationKind::OneToOne,
                    Some("api::file.file"),
                    None,
                    None,
                    Some(join_table(
                        "articles_hero_image_lnk",
                        "article_id",
                        "file_id",
                        None,
                        None,
                    )),
                ),
            ),
            (
                "seo".to_owned(),
                Attribute::Component(ComponentAttr {
                    component: "shared.seo".to_owned(),
                    repeatable: false,
                }),
            ),
            (
                "blocks".to_owned(),
                Attribute::DynamicZone(DynamicZoneAttr {
                    components: vec!["shared.seo".to_owned(), "shared.gallery".to_owned()],
                }),
            ),
        ]),
    });

    registry.register_content_type(ContentType {
        uid: "api::category.category".to_owned(),
        collection_name: "categories".to_owned(),
        draft_and_publish: true,
        attributes: Attributes::from([
            ("name".to_owned(), Attribute::Scalar),
            (
                "articles".to_owned(),
                relation(
                    RelationKind::ManyToMany,
                    Some("api::article.article"),
                    None,
                    Some("categories"),
                    Some(join_table(
                        "articles_categories_lnk",
                        "category_id",
                        "article_id",
                        Some("article_ord"),
                        Some("category_ord"),
                    )),
                ),
            ),
        ]),
    });

    registry.register_content_type(ContentType {
        uid: "api::tag.tag".to_owned(),
        collection_name: "tags".to_owned(),
        draft_and_publish: false,
        attributes: Attributes::from([
            ("label".to_owned(), Attribute::Scalar),
            (
                "articles".to_owned(),
                relation(
                    RelationKind::ManyToMany,
                    Some("api::article.article"),
                    None,
                    Some("tags"),
                    Some(join_table(
                        "articles_tags_lnk",
                        "tag_id",
                        "article_id",
                        Some("article_ord"),
                        Some("tag_ord"),
                    )),
                ),
            ),
        ]),
    });

    registry.register_content_type(ContentType {
        uid: "api::writer.writer".to_owned(),
        collection_name: "writers".to_owned(),
        draft_and_publish: false,
        attributes: Attributes::from([
            ("name".to_owned(), Attribute::Scalar),
            (
                "articles".to_owned(),
                relation(
                    RelationKind::OneToMany,
                    Some("api::article.article"),
                    None,
                    Some("author"),
                    Some(join_table(
                        "articles_author_lnk",
                        "author_id",
                        "article_id",
                        Some("article_ord"),
                        None,
                    )),
                ),
            ),
        ]),
    });

    registry.register_content_type(ContentType {
        uid: "api::file.file".to_owned(),
        collection_name: "files".to_owned(),
        draft_and_publish: false,
        attributes: Attributes::from([
            ("name".to_owned(), Attribute::Scalar),
            (
                "related".to_owned(),
                relation(RelationKind::MorphToMany, None, None, None, None),
            ),
        ]),
    });

    registry.register_component(Component {
        uid: "shared.seo".to_owned(),
        collection_name: "components_shared_seos".to_owned(),
        attributes: Attributes::from([
            ("meta_title".to_owned(), Attribute::Scalar),
            (
                "og_image".to_owned(),
                relation(
                    RelationKind::OneToOne,
                    Some("api::file.file"),
                    None,
                    None,
                    None,
                ),
            ),
        ]),
    });

    registry.register_component(Component {
        uid: "shared.gallery".to_owned(),
        collection_name: "components_shared_galleries".to_owned(),
        attributes: Attributes::from([
            ("caption".to_owned(), Attribute::Scalar),
            (
                "images".to_owned(),
                relation(
                    RelationKind::OneToMany,
                    Some("api::file.file"),
                    None,
                    None,
                    None,
                ),
            ),
        ]),
    });

    registry
}
