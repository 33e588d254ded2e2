use sea_query::{Alias, ColumnDef, Index, IndexCreateStatement, Table, TableCreateStatement};

use crate::schema::{
    ContentType, DOCUMENT_ID_COLUMN, ID_COLUMN, JoinTable, LOCALE_COLUMN, PUBLISHED_AT_COLUMN,
};

/// Build the `CREATE TABLE` statement for a relation join table.
///
/// The table carries a surrogate primary key, one foreign key column per side
/// and the optional fractional order columns. No `FOREIGN KEY` constraints are
/// emitted since the descriptor does not name the referenced tables.
pub fn join_table_create_statement(join_table: &JoinTable) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(&join_table.name))
        .if_not_exists()
        .col(
            ColumnDef::new(Alias::new(ID_COLUMN))
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(Alias::new(&join_table.source_column))
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(Alias::new(&join_table.target_column))
                .big_integer()
                .not_null(),
        );
    if let Some(order_column) = &join_table.order_column {
        stmt.col(ColumnDef::new(Alias::new(order_column)).double());
    }
    if let Some(inverse_order_column) = &join_table.inverse_order_column {
        stmt.col(ColumnDef::new(Alias::new(inverse_order_column)).double());
    }
    stmt
}

/// Indexes expected on a join table: one per foreign key plus a unique
/// constraint over the pair.
pub fn join_table_index_statements(join_table: &JoinTable) -> Vec<IndexCreateStatement> {
    let table = Alias::new(&join_table.name);
    vec![
        Index::create()
            .name(&format!("{}_fk", join_table.name))
            .table(table.clone())
            .col(Alias::new(&join_table.source_column))
            .to_owned(),
        Index::create()
            .name(&format!("{}_inv_fk", join_table.name))
            .table(table.clone())
            .col(Alias::new(&join_table.target_column))
            .to_owned(),
        Index::create()
            .name(&format!("{}_unique", join_table.name))
            .table(table)
            .col(Alias::new(&join_table.source_column))
            .col(Alias::new(&join_table.target_column))
            .unique()
            .to_owned(),
    ]
}

/// Build the `CREATE TABLE` statement for a content type's entry table,
/// reduced to the columns the engine reads. `published_at` doubles as the
/// draft marker, NULL means draft.
pub fn entry_table_create_statement(content_type: &ContentType) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(&content_type.collection_name))
        .if_not_exists()
        .col(
            ColumnDef::new(Alias::new(ID_COLUMN))
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(Alias::new(DOCUMENT_ID_COLUMN))
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(Alias::new(LOCALE_COLUMN)).string())
        .col(ColumnDef::new(Alias::new(PUBLISHED_AT_COLUMN)).timestamp());
    stmt
}
