use crate::DbBackend;
use sea_query::{
    MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder, Value, Values, inject_parameters,
};
use std::fmt;

/// One SQL statement with its bind values, ready to run on a connection
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The SQL text
    pub sql: String,
    /// The bind values, if any
    pub values: Option<Values>,
    /// The dialect the SQL was rendered in
    pub db_backend: DbBackend,
}

/// Renders a sea-query statement into a [Statement] for a given backend
pub trait StatementBuilder {
    fn build(&self, db_backend: &DbBackend) -> Statement;
}

impl Statement {
    /// Create a [Statement] from a [DbBackend] and a raw SQL statement
    pub fn from_string<T>(db_backend: DbBackend, stmt: T) -> Statement
    where
        T: Into<String>,
    {
        Statement {
            sql: stmt.into(),
            values: None,
            db_backend,
        }
    }

    /// Create a SQL statement from a [DbBackend] and a raw SQL statement with values
    pub fn from_sql_and_values<T, I>(db_backend: DbBackend, sql: T, values: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = Value>,
    {
        Self::from_string_values_tuple(
            db_backend,
            (sql.into(), Values(values.into_iter().collect())),
        )
    }

    pub(crate) fn from_string_values_tuple(
        db_backend: DbBackend,
        stmt: (String, Values),
    ) -> Statement {
        Statement {
            sql: stmt.0,
            values: Some(stmt.1),
            db_backend,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.values {
            Some(values) => {
                let string = inject_parameters(
                    &self.sql,
                    values.0.clone(),
                    self.db_backend.get_query_builder().as_ref(),
                );
                write!(f, "{}", &string)
            }
            None => {
                write!(f, "{}", &self.sql)
            }
        }
    }
}

macro_rules! build_any_stmt {
    ($stmt: expr, $db_backend: expr) => {
        match $db_backend {
            DbBackend::MySql => $stmt.build(MysqlQueryBuilder),
            DbBackend::Postgres => $stmt.build(PostgresQueryBuilder),
            DbBackend::Sqlite => $stmt.build(SqliteQueryBuilder),
        }
    };
}

macro_rules! build_query_stmt {
    ($stmt: ty) => {
        impl StatementBuilder for $stmt {
            fn build(&self, db_backend: &DbBackend) -> Statement {
                let stmt = build_any_stmt!(self, db_backend);
                Statement {
                    sql: stmt.0,
                    values: Some(stmt.1),
                    db_backend: *db_backend,
                }
            }
        }
    };
}

build_query_stmt!(sea_query::SelectStatement);
build_query_stmt!(sea_query::InsertStatement);
build_query_stmt!(sea_query::UpdateStatement);
build_query_stmt!(sea_query::DeleteStatement);

macro_rules! build_schema_stmt {
    ($stmt: ty) => {
        impl StatementBuilder for $stmt {
            fn build(&self, db_backend: &DbBackend) -> Statement {
                let stmt = build_any_stmt!(self, db_backend);
                Statement {
                    sql: stmt,
                    values: None,
                    db_backend: *db_backend,
                }
            }
        }
    };
}

build_schema_stmt!(sea_query::TableCreateStatement);
build_schema_stmt!(sea_query::TableDropStatement);
build_schema_stmt!(sea_query::IndexCreateStatement);

#[cfg(test)]
mod tests {
    use crate::DbBackend;
    use pretty_assertions::assert_eq;
    use sea_query::{Alias, Expr, Query};

    #[test]
    fn build_on_each_backend() {
        let query = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("articles"))
            .and_where(Expr::col(Alias::new("document_id")).eq("abc"))
            .to_owned();

        let stmt = DbBackend::Postgres.build(&query);
        assert_eq!(
            stmt.sql,
            r#"SELECT "id" FROM "articles" WHERE "document_id" = $1"#
        );

        let stmt = DbBackend::MySql.build(&query);
        assert_eq!(stmt.sql, "SELECT `id` FROM `articles` WHERE `document_id` = ?");

        let stmt = DbBackend::Sqlite.build(&query);
        assert_eq!(
            stmt.sql,
            r#"SELECT "id" FROM "articles" WHERE "document_id" = ?"#
        );
    }

    #[test]
    fn display_injects_values() {
        let query = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("articles"))
            .and_where(Expr::col(Alias::new("id")).is_in([1i64, 2, 3]))
            .to_owned();

        let stmt = DbBackend::Postgres.build(&query);
        assert_eq!(
            stmt.to_string(),
            r#"SELECT "id" FROM "articles" WHERE "id" IN (1, 2, 3)"#
        );
    }
}
