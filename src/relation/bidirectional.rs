use std::collections::BTreeMap;

use sea_query::{Alias, Expr, Query, Value};
use tracing::instrument;

use crate::schema::{JoinTable, SchemaRegistry};
use crate::{ConnectionTrait, DbErr};

/// Identity of one stored version of an entry: its row id plus the locale the
/// row belongs to. Non-localized entries carry no locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryVersion {
    pub id: i64,
    pub locale: Option<String>,
}

impl EntryVersion {
    pub fn new(id: i64, locale: Option<&str>) -> Self {
        Self {
            id,
            locale: locale.map(str::to_owned),
        }
    }
}

/// One captured join-table row: the unchanged side, the side about to change
/// identity, and the order value to carry over.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRow {
    pub source: i64,
    pub target: i64,
    pub order: Option<f64>,
}

/// All captured rows of one join table, paired with its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSnapshot {
    pub join_table: JoinTable,
    pub rows: Vec<LinkRow>,
}

/// Capture the inverse-side order of every bidirectional relation pointing at
/// `uid` before its entries change identity.
///
/// Scans every content type and component for relation attributes that target
/// `uid`, declare an inverse side and live on another schema (self references
/// are recreated together with the entries and need no correction), then
/// reads each attribute's join table filtered to rows referencing one of the
/// old entry ids. Join tables with no matching rows are omitted. Reads only;
/// run it on the same transaction as [`sync_bidirectional_orders`] so both
/// see one consistent snapshot.
#[instrument(level = "trace", skip(db, registry))]
pub async fn load_bidirectional_orders<C>(
    db: &C,
    registry: &SchemaRegistry,
    uid: &str,
    old_versions: &[EntryVersion],
) -> Result<Vec<LinkSnapshot>, DbErr>
where
    C: ConnectionTrait,
{
    let mut snapshots = Vec::new();
    if old_versions.is_empty() {
        return Ok(snapshots);
    }

    let owners = registry
        .content_types()
        .map(|content_type| (content_type.uid.as_str(), &content_type.attributes))
        .chain(
            registry
                .components()
                .map(|component| (component.uid.as_str(), &component.attributes)),
        );

    for (owner_uid, attributes) in owners {
        if owner_uid == uid {
            continue;
        }
        for attribute in attributes.values() {
            let Some(relation) = attribute.as_relation() else {
                continue;
            };
            if !relation.targets(uid) || !relation.is_bidirectional() {
                continue;
            }
            let Some(join_table) = &relation.join_table else {
                continue;
            };

            let mut query = Query::select();
            query
                .column(Alias::new(&join_table.source_column))
                .column(Alias::new(&join_table.target_column))
                .from(Alias::new(&join_table.name))
                .and_where(
                    Expr::col(Alias::new(&join_table.target_column))
                        .is_in(old_versions.iter().map(|version| version.id)),
                );
            if let Some(order_column) = &join_table.order_column {
                query.column(Alias::new(order_column));
            }

            let results = db.query_all(db.get_database_backend().build(&query)).await?;
            let mut rows = Vec::with_capacity(results.len());
            for row in results {
                let order = match &join_table.order_column {
                    Some(order_column) => row.try_get("", order_column)?,
                    None => None,
                };
                rows.push(LinkRow {
                    source: row.try_get("", &join_table.source_column)?,
                    target: row.try_get("", &join_table.target_column)?,
                    order,
                });
            }
            if !rows.is_empty() {
                snapshots.push(LinkSnapshot {
                    join_table: join_table.clone(),
                    rows,
                });
            }
        }
    }
    Ok(snapshots)
}

/// Rewrite the captured inverse-side orders onto the replacement entries.
///
/// Old and new versions pair up by locale; an old version whose locale got no
/// replacement is skipped without error, as are whole snapshots lacking order
/// column metadata. Every update keys one row by its unchanged side plus the
/// remapped id and writes only the captured order value. The entry creation
/// step has already inserted the new rows, so there is nothing to insert
/// here. Run on the same transaction as the capture; any error rolls the
/// whole transition back.
#[instrument(level = "trace", skip(db, snapshots))]
pub async fn sync_bidirectional_orders<C>(
    db: &C,
    old_versions: &[EntryVersion],
    new_versions: &[EntryVersion],
    snapshots: &[LinkSnapshot],
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    // last write wins when two new versions share a locale
    let mut new_by_locale: BTreeMap<Option<&str>, i64> = BTreeMap::new();
    for version in new_versions {
        new_by_locale.insert(version.locale.as_deref(), version.id);
    }
    let mut id_map: BTreeMap<i64, i64> = BTreeMap::new();
    for version in old_versions {
        if let Some(new_id) = new_by_locale.get(&version.locale.as_deref()) {
            id_map.insert(version.id, *new_id);
        }
    }

    for snapshot in snapshots {
        let join_table = &snapshot.join_table;
        // incomplete column metadata skips the whole group
        let Some(order_column) = &join_table.order_column else {
            continue;
        };
        if join_table.source_column.is_empty() || join_table.target_column.is_empty() {
            continue;
        }
        for row in &snapshot.rows {
            let Some(new_id) = id_map.get(&row.target) else {
                continue;
            };
            let stmt = Query::update()
                .table(Alias::new(&join_table.name))
                .value(Alias::new(order_column), Value::Double(row.order))
                .and_where(Expr::col(Alias::new(&join_table.source_column)).eq(row.source))
                .and_where(Expr::col(Alias::new(&join_table.target_column)).eq(*new_id))
                .to_owned();
            // TODO batch rows sharing an order value into one update
            db.execute(db.get_database_backend().build(&stmt)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_cfg::blog_registry;
    use crate::{DbBackend, DbErr, MockDatabase, Statement, Transaction, TransactionTrait};
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    fn version(id: i64, locale: Option<&str>) -> EntryVersion {
        EntryVersion::new(id, locale)
    }

    fn categories_join_table() -> JoinTable {
        JoinTable {
            name: "articles_categories_lnk".to_owned(),
            source_column: "category_id".to_owned(),
            target_column: "article_id".to_owned(),
            order_column: Some("article_ord".to_owned()),
            inverse_order_column: Some("category_ord".to_owned()),
        }
    }

    #[smol_potat::test]
    async fn load_captures_rows_of_every_candidate_relation() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([
                // categories
                vec![
                    btreemap! {
                        "category_id" => Value::BigInt(Some(5)),
                        "article_id" => Value::BigInt(Some(1)),
                        "article_ord" => Value::Double(Some(2.0)),
                    },
                    btreemap! {
                        "category_id" => Value::BigInt(Some(5)),
                        "article_id" => Value::BigInt(Some(2)),
                        "article_ord" => Value::Double(Some(1.0)),
                    },
                ],
                // tags
                vec![],
                // writer
                vec![btreemap! {
                    "author_id" => Value::BigInt(Some(9)),
                    "article_id" => Value::BigInt(Some(1)),
                    "article_ord" => Value::Double(Some(3.0)),
                }],
            ])
            .into_connection();

        let old_versions = [version(1, Some("en")), version(2, Some("fr"))];
        let snapshots = load_bidirectional_orders(
            &db,
            &blog_registry(),
            "api::article.article",
            &old_versions,
        )
        .await
        .unwrap();

        assert_eq!(
            snapshots,
            [
                LinkSnapshot {
                    join_table: categories_join_table(),
                    rows: vec![
                        LinkRow {
                            source: 5,
                            target: 1,
                            order: Some(2.0),
                        },
                        LinkRow {
                            source: 5,
                            target: 2,
                            order: Some(1.0),
                        },
                    ],
                },
                LinkSnapshot {
                    join_table: JoinTable {
                        name: "articles_author_lnk".to_owned(),
                        source_column: "author_id".to_owned(),
                        target_column: "article_id".to_owned(),
                        order_column: Some("article_ord".to_owned()),
                        inverse_order_column: None,
                    },
                    rows: vec![LinkRow {
                        source: 9,
                        target: 1,
                        order: Some(3.0),
                    }],
                },
            ]
        );

        assert_eq!(
            db.into_transaction_log(),
            [
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
            ]
            .map(Transaction::one)
        );
    }

    #[smol_potat::test]
    async fn load_excludes_self_references_and_one_way_relations() {
        // Relations targeting files are all unidirectional or morphs, and the
        // article self reference never counts, so nothing is read at all.
        let db = MockDatabase::new(DbBackend::Postgres).into_connection();
        let snapshots =
            load_bidirectional_orders(&db, &blog_registry(), "api::file.file", &[version(1, None)])
                .await
                .unwrap();
        assert_eq!(snapshots, Vec::<LinkSnapshot>::new());
        assert_eq!(db.into_transaction_log(), Vec::<Transaction>::new());
    }

    #[smol_potat::test]
    async fn load_without_old_versions_reads_nothing() {
        let db = MockDatabase::new(DbBackend::Postgres).into_connection();
        let snapshots =
            load_bidirectional_orders(&db, &blog_registry(), "api::article.article", &[])
                .await
                .unwrap();
        assert_eq!(snapshots, Vec::<LinkSnapshot>::new());
        assert_eq!(db.into_transaction_log(), Vec::<Transaction>::new());
    }

    #[smol_potat::test]
    async fn sync_remaps_ids_and_preserves_order_values() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results(vec![Default::default(); 3])
            .into_connection();

        let old_versions = [version(1, Some("en")), version(2, Some("fr"))];
        let new_versions = [version(11, Some("en")), version(12, Some("fr"))];
        let snapshots = [LinkSnapshot {
            join_table: categories_join_table(),
            rows: vec![
                LinkRow {
                    source: 5,
                    target: 1,
                    order: Some(2.0),
                },
                LinkRow {
                    source: 5,
                    target: 2,
                    order: Some(1.0),
                },
                LinkRow {
                    source: 6,
                    target: 1,
                    order: Some(1.0),
                },
            ],
        }];
        sync_bidirectional_orders(&db, &old_versions, &new_versions, &snapshots)
            .await
            .unwrap();

        let update = |order: f64, source: i64, target: i64| {
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(order)), source.into(), target.into()],
            )
        };
        assert_eq!(
            db.into_transaction_log(),
            [update(2.0, 5, 11), update(1.0, 5, 12), update(1.0, 6, 11)].map(Transaction::one)
        );
    }

    #[smol_potat::test]
    async fn sync_skips_old_versions_whose_locale_has_no_new_entry() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([Default::default()])
            .into_connection();

        let old_versions = [version(1, Some("en")), version(2, Some("de"))];
        let new_versions = [version(11, Some("en"))];
        let snapshots = [LinkSnapshot {
            join_table: categories_join_table(),
            rows: vec![
                LinkRow {
                    source: 5,
                    target: 2,
                    order: Some(1.0),
                },
                LinkRow {
                    source: 5,
                    target: 1,
                    order: Some(2.0),
                },
            ],
        }];
        sync_bidirectional_orders(&db, &old_versions, &new_versions, &snapshots)
            .await
            .unwrap();

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(2.0)), 5i64.into(), 11i64.into()],
            ))]
        );
    }

    #[smol_potat::test]
    async fn sync_skips_snapshots_without_order_metadata() {
        let db = MockDatabase::new(DbBackend::Postgres).into_connection();

        let snapshots = [LinkSnapshot {
            join_table: JoinTable {
                name: "articles_author_lnk".to_owned(),
                source_column: "article_id".to_owned(),
                target_column: "author_id".to_owned(),
                order_column: None,
                inverse_order_column: Some("article_ord".to_owned()),
            },
            rows: vec![LinkRow {
                source: 1,
                target: 9,
                order: None,
            }],
        }];
        sync_bidirectional_orders(&db, &[version(9, None)], &[version(19, None)], &snapshots)
            .await
            .unwrap();

        assert_eq!(db.into_transaction_log(), Vec::<Transaction>::new());
    }

    #[smol_potat::test]
    async fn sync_pairs_entries_without_locale_and_lets_the_last_duplicate_win() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([Default::default()])
            .into_connection();

        let old_versions = [version(1, None)];
        let new_versions = [version(11, None), version(12, None)];
        let snapshots = [LinkSnapshot {
            join_table: categories_join_table(),
            rows: vec![LinkRow {
                source: 5,
                target: 1,
                order: Some(4.0),
            }],
        }];
        sync_bidirectional_orders(&db, &old_versions, &new_versions, &snapshots)
            .await
            .unwrap();

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                [Value::Double(Some(4.0)), 5i64.into(), 12i64.into()],
            ))]
        );
    }

    #[smol_potat::test]
    async fn load_and_sync_share_one_transaction() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([
                vec![btreemap! {
                    "category_id" => Value::BigInt(Some(5)),
                    "article_id" => Value::BigInt(Some(1)),
                    "article_ord" => Value::Double(Some(3.0)),
                }],
                Vec::new(),
                Vec::new(),
            ])
            .append_exec_results([Default::default()])
            .into_connection();

        db.transaction::<_, (), DbErr>(|txn| {
            Box::pin(async move {
                let registry = blog_registry();
                let old_versions = [version(1, Some("en"))];
                let snapshots =
                    load_bidirectional_orders(txn, &registry, "api::article.article", &old_versions)
                        .await?;
                sync_bidirectional_orders(
                    txn,
                    &old_versions,
                    &[version(11, Some("en"))],
                    &snapshots,
                )
                .await
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
                    r#"SELECT "category_id", "article_id", "article_ord" FROM "articles_categories_lnk" WHERE "article_id" IN ($1)"#,
                    [1i64.into()],
                ),
                Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    r#"SELECT "tag_id", "article_id", "article_ord" FROM "articles_tags_lnk" WHERE "article_id" IN ($1)"#,
                    [1i64.into()],
                ),
                Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    r#"SELECT "author_id", "article_id", "article_ord" FROM "articles_author_lnk" WHERE "article_id" IN ($1)"#,
                    [1i64.into()],
                ),
                Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    r#"UPDATE "articles_categories_lnk" SET "article_ord" = $1 WHERE "category_id" = $2 AND "article_id" = $3"#,
                    [Value::Double(Some(3.0)), 5i64.into(), 11i64.into()],
                ),
                Statement::from_string(DbBackend::Postgres, "COMMIT"),
            ])]
        );
    }
}
