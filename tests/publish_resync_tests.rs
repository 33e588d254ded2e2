#![cfg(feature = "mock")]

use document_relations::sea_query::Value;
use document_relations::tests_cfg::blog_registry;
use document_relations::{
    Connect, DbBackend, DbErr, DocumentStatus, EntryVersion, LinkPlan, LinkSnapshot, MockDatabase,
    Position, RelationId, RelationOps, RelationValue, Statement, Transaction, TransactionTrait,
    extract_entry_ids, load_bidirectional_orders, plan_links, resolve_entry_ids,
    sync_bidirectional_orders,
};
use maplit::btreemap;
use pretty_assertions::assert_eq;
use serde_json::json;

#[smol_potat::test]
async fn relation_payload_flows_from_extraction_to_a_link_plan() {
    let registry = blog_registry();
    let payload = json!({
        "title": "Sea shanties",
        "categories": { "connect": [{ "id": "doc-shanty", "position": { "start": true } }] },
        "tags": [3, 4],
    });

    let referenced = extract_entry_ids(&registry, "api::article.article", &payload);
    assert_eq!(
        referenced,
        [
            RelationId::from("doc-shanty"),
            RelationId::Int(3),
            RelationId::Int(4),
        ]
    );

    let db = MockDatabase::new(DbBackend::Postgres)
        .append_query_results([vec![btreemap! {
            "id" => Value::BigInt(Some(7)),
            "document_id" => Value::from("doc-shanty"),
        }]])
        .into_connection();

    let resolved = resolve_entry_ids(
        &db,
        &registry,
        "api::category.category",
        &[RelationId::from("doc-shanty")],
        DocumentStatus::Draft,
        Some("en"),
    )
    .await
    .unwrap();
    assert_eq!(resolved, btreemap! { RelationId::from("doc-shanty") => 7 });

    let ops = RelationOps {
        connect: vec![Connect::at(7, Position::Start)],
        ..Default::default()
    };
    let plan = plan_links(&[], &RelationValue::Ops(ops), false).unwrap();
    assert_eq!(
        plan,
        LinkPlan {
            detach: vec![],
            attach: vec![(RelationId::Int(7), 1.0)],
        }
    );

    assert_eq!(
        db.into_transaction_log(),
        [Transaction::one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT "id", "document_id" FROM "categories" WHERE "document_id" IN ($1) AND "published_at" IS NULL AND "locale" = $2"#,
            ["doc-shanty".into(), "en".into()],
        ))]
    );
}

#[smol_potat::test]
async fn publishing_rewrites_inverse_orders_onto_the_new_entries() {
    let db = MockDatabase::new(DbBackend::Postgres)
        .append_query_results([
            // categories pointing at either draft
            vec![
                btreemap! {
                    "category_id" => Value::BigInt(Some(7)),
                    "article_id" => Value::BigInt(Some(1)),
                    "article_ord" => Value::Double(Some(2.0)),
                },
                btreemap! {
                    "category_id" => Value::BigInt(Some(7)),
                    "article_id" => Value::BigInt(Some(2)),
                    "article_ord" => Value::Double(Some(1.0)),
                },
            ],
            // tags
            vec![],
            // writer
            vec![btreemap! {
                "author_id" => Value::BigInt(Some(9)),
                "article_id" => Value::BigInt(Some(2)),
                "article_ord" => Value::Double(Some(1.0)),
            }],
        ])
        .append_exec_results(vec![Default::default(); 3])
        .into_connection();

    let snapshots = db
        .transaction::<_, Vec<LinkSnapshot>, DbErr>(|txn| {
            Box::pin(async move {
                let registry = blog_registry();
                let old_versions = [
                    EntryVersion::new(1, Some("en")),
                    EntryVersion::new(2, Some("fr")),
                ];
                let new_versions = [
                    EntryVersion::new(11, Some("en")),
                    EntryVersion::new(12, Some("fr")),
                ];
                let snapshots = load_bidirectional_orders(
                    txn,
                    &registry,
                    "api::article.article",
                    &old_versions,
                )
                .await?;
                sync_bidirectional_orders(txn, &old_versions, &new_versions, &snapshots).await?;
                Ok(snapshots)
            })
        })
        .await
        .unwrap();

    let captured: Vec<&str> = snapshots
        .iter()
        .map(|snapshot| snapshot.join_table.name.as_str())
        .collect();
    assert_eq!(captured, ["articles_categories_lnk", "articles_author_lnk"]);

    assert_eq!(
        db.into_transaction_log(),
        [Transaction::many([
            Statement::from_string(DbBackend::Postgres, "BEGIN"),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT "category_id", "article_id", "article_ord" FROM "articles_categories_lnk" WHERE "article_id" IN ($1, $2)"#,
                [1i64.into(), 2i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT "tag_id", "article_id", "article_ord" FROM "articles_tags_lnk" WHERE "article_id" IN ($1, $2)"#,
                [1i64.into(), 2i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT "author_id", "article_id", "article_ord" FROM "articles_author_lnk" WHERE "article_id" IN ($1, $2)"#,
                [1i64.into(), 2i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(2.0)), 7i64.into(), 11i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(1.0)), 7i64.into(), 12i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_author_lnk" SET "article_ord" = $1 WHERE "author_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(1.0)), 9i64.into(), 12i64.into()],
            ),
            Statement::from_string(DbBackend::Postgres, "COMMIT"),
        ])]
    );
}

#[smol_potat::test]
async fn discarding_a_draft_only_touches_locales_that_gained_a_replacement() {
    let db = MockDatabase::new(DbBackend::Postgres)
        .append_query_results([
            vec![
                btreemap! {
                    "category_id" => Value::BigInt(Some(7)),
                    "article_id" => Value::BigInt(Some(11)),
                    "article_ord" => Value::Double(Some(4.0)),
                },
                btreemap! {
                    "category_id" => Value::BigInt(Some(7)),
                    "article_id" => Value::BigInt(Some(12)),
                    "article_ord" => Value::Double(Some(9.0)),
                },
            ],
            vec![],
            vec![],
        ])
        .append_exec_results([Default::default()])
        .into_connection();

    // the French draft was deleted outright, only English gets a fresh copy
    db.transaction::<_, (), DbErr>(|txn| {
        Box::pin(async move {
            let registry = blog_registry();
            let old_versions = [
                EntryVersion::new(11, Some("en")),
                EntryVersion::new(12, Some("fr")),
            ];
            let new_versions = [EntryVersion::new(21, Some("en"))];
            let snapshots =
                load_bidirectional_orders(txn, &registry, "api::article.article", &old_versions)
                    .await?;
            sync_bidirectional_orders(txn, &old_versions, &new_versions, &snapshots).await
        })
    })
    .await
    .unwrap();

    assert_eq!(
        db.into_transaction_log(),
        [Transaction::many([
            Statement::from_string(DbBackend::Postgres, "BEGIN"),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT "category_id", "article_id", "article_ord" FROM "articles_categories_lnk" WHERE "article_id" IN ($1, $2)"#,
                [11i64.into(), 12i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT "tag_id", "article_id", "article_ord" FROM "articles_tags_lnk" WHERE "article_id" IN ($1, $2)"#,
                [11i64.into(), 12i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT "author_id", "article_id", "article_ord" FROM "articles_author_lnk" WHERE "article_id" IN ($1, $2)"#,
                [11i64.into(), 12i64.into()],
            ),
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(4.0)), 7i64.into(), 21i64.into()],
            ),
            Statement::from_string(DbBackend::Postgres, "COMMIT"),
        ])]
    );
}
