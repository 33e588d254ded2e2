use std::collections::{BTreeMap, BTreeSet};

use itertools::{Either, Itertools};
use sea_query::{Alias, Expr, Query};
use tracing::instrument;

use crate::relation::RelationId;
use crate::schema::{DOCUMENT_ID_COLUMN, ID_COLUMN, LOCALE_COLUMN, PUBLISHED_AT_COLUMN, SchemaRegistry};
use crate::{ConnectionTrait, DbErr};

/// Which version of a document an id lookup should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Draft,
    Published,
}

/// Resolve raw relation ids to entry row ids for the content type `uid`.
///
/// Numeric ids pass through untouched. String ids are document ids and
/// resolve through one `SELECT` against the target's entry table, filtered to
/// the requested status and, when given, locale. Document ids without a
/// matching entry are simply absent from the result; when several entries
/// share a document id (a locale was not given) the last row returned wins.
#[instrument(level = "trace", skip(db, registry))]
pub async fn resolve_entry_ids<C>(
    db: &C,
    registry: &SchemaRegistry,
    uid: &str,
    ids: &[RelationId],
    status: DocumentStatus,
    locale: Option<&str>,
) -> Result<BTreeMap<RelationId, i64>, DbErr>
where
    C: ConnectionTrait,
{
    let Some(content_type) = registry.content_type(uid) else {
        return Err(DbErr::Custom(format!("unknown content type '{uid}'")));
    };

    let (passthrough, documents): (Vec<i64>, BTreeSet<String>) =
        ids.iter().partition_map(|id| match id {
            RelationId::Int(id) => Either::Left(*id),
            RelationId::Str(document_id) => Either::Right(document_id.clone()),
        });

    let mut resolved = BTreeMap::new();
    for id in passthrough {
        resolved.insert(RelationId::Int(id), id);
    }
    if documents.is_empty() {
        return Ok(resolved);
    }

    let mut query = Query::select();
    query
        .column(Alias::new(ID_COLUMN))
        .column(Alias::new(DOCUMENT_ID_COLUMN))
        .from(Alias::new(&content_type.collection_name))
        .and_where(Expr::col(Alias::new(DOCUMENT_ID_COLUMN)).is_in(documents))
        .and_where(match status {
            DocumentStatus::Draft => Expr::col(Alias::new(PUBLISHED_AT_COLUMN)).is_null(),
            DocumentStatus::Published => Expr::col(Alias::new(PUBLISHED_AT_COLUMN)).is_not_null(),
        });
    if let Some(locale) = locale {
        query.and_where(Expr::col(Alias::new(LOCALE_COLUMN)).eq(locale));
    }

    let rows = db.query_all(db.get_database_backend().build(&query)).await?;
    for row in rows {
        let id: i64 = row.try_get("", ID_COLUMN)?;
        let document_id: String = row.try_get("", DOCUMENT_ID_COLUMN)?;
        resolved.insert(RelationId::Str(document_id), id);
    }
    Ok(resolved)
}
