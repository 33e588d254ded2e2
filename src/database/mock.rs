use crate::{
    ColIdx, DatabaseConnection, DbBackend, DbErr, ExecResult, ExecResultHolder,
    MockDatabaseConnection, MockDatabaseTrait, QueryResult, QueryResultRow, Statement, error::*,
};
use sea_query::{Value, ValueType, Values};
use std::{collections::BTreeMap, sync::Arc};

/// Defines a Mock database suitable for testing
///
/// Seed it with query and exec results, run your content logic against the
/// connection, then inspect the transaction log:
///
/// ```
/// # use document_relations::{error::*, tests_cfg::*, DbBackend, DocumentStatus, MockDatabase, RelationId, Transaction};
/// # use document_relations::sea_query::Value;
/// # use maplit::btreemap;
/// #
/// # let db = MockDatabase::new(DbBackend::Postgres)
/// #     .append_query_results([vec![btreemap! {
/// #         "id" => Value::BigInt(Some(11)),
/// #         "document_id" => Value::from("doc-a"),
/// #     }]])
/// #     .into_connection();
/// #
/// use document_relations::resolve_entry_ids;
///
/// # let _: Result<(), DbErr> = smol::block_on(async {
/// #
/// assert_eq!(
///     resolve_entry_ids(
///         &db,
///         &blog_registry(),
///         "api::article.article",
///         &[RelationId::from("doc-a")],
///         DocumentStatus::Draft,
///         None,
///     )
///     .await?,
///     btreemap! { RelationId::from("doc-a") => 11 }
/// );
/// #
/// # Ok(())
/// # });
///
/// assert_eq!(
///     db.into_transaction_log(),
///     [Transaction::from_sql_and_values(
///         DbBackend::Postgres,
///         r#"SELECT "id", "document_id" FROM "articles" WHERE "document_id" IN ($1) AND "published_at" IS NULL"#,
///         ["doc-a".into()],
///     )]
/// );
/// ```
#[derive(Debug)]
pub struct MockDatabase {
    db_backend: DbBackend,
    transaction: Option<OpenTransaction>,
    transaction_log: Vec<Transaction>,
    exec_results: Vec<Result<MockExecResult, DbErr>>,
    query_results: Vec<Result<Vec<MockRow>, DbErr>>,
}

/// Defines the results obtained from a [MockDatabase]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockExecResult {
    /// The last inserted id on this database
    pub last_insert_id: u64,
    /// The number of rows affected by the database operation
    pub rows_affected: u64,
}

/// Defines the row returned by a [MockDatabase]
#[derive(Clone, Debug)]
pub struct MockRow {
    values: BTreeMap<String, Value>,
}

/// A trait to get a [MockRow] from a type useful for testing in the [MockDatabase]
pub trait IntoMockRow {
    /// The method to implement to get a [MockRow]
    fn into_mock_row(self) -> MockRow;
}

/// Defines a transaction that has been committed to the [MockDatabase]
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    stmts: Vec<Statement>,
}

/// Holds a transaction depth and a vector of statements
#[derive(Debug)]
pub struct OpenTransaction {
    stmts: Vec<Statement>,
    transaction_depth: usize,
}

impl MockDatabase {
    /// Instantiate a mock database with a [DbBackend] to simulate real world cases
    pub fn new(db_backend: DbBackend) -> Self {
        Self {
            db_backend,
            transaction: None,
            transaction_log: Vec::new(),
            exec_results: Vec::new(),
            query_results: Vec::new(),
        }
    }

    /// Create a database connection
    pub fn into_connection(self) -> DatabaseConnection {
        DatabaseConnection::MockDatabaseConnection(Arc::new(MockDatabaseConnection::new(self)))
    }

    /// Add the [MockExecResult]s to the buffer consumed by `execute` operations
    pub fn append_exec_results<I>(mut self, vec: I) -> Self
    where
        I: IntoIterator<Item = MockExecResult>,
    {
        self.exec_results.extend(vec.into_iter().map(Ok));
        self
    }

    /// Add the [MockRow]s to the buffer consumed by `query_one` and `query_all` operations
    pub fn append_query_results<T, I, II>(mut self, vec: II) -> Self
    where
        T: IntoMockRow,
        I: IntoIterator<Item = T>,
        II: IntoIterator<Item = I>,
    {
        for rows in vec.into_iter() {
            let rows = rows.into_iter().map(|row| row.into_mock_row()).collect();
            self.query_results.push(Ok(rows));
        }
        self
    }

    /// Add errors to be returned by `execute` operations
    pub fn append_exec_errors<I>(mut self, vec: I) -> Self
    where
        I: IntoIterator<Item = DbErr>,
    {
        self.exec_results.extend(vec.into_iter().map(Err));
        self
    }

    /// Add errors to be returned by `query_one` and `query_all` operations
    pub fn append_query_errors<I>(mut self, vec: I) -> Self
    where
        I: IntoIterator<Item = DbErr>,
    {
        self.query_results.extend(vec.into_iter().map(Err));
        self
    }
}

impl MockDatabaseTrait for MockDatabase {
    fn execute(&mut self, counter: usize, statement: Statement) -> Result<ExecResult, DbErr> {
        if let Some(transaction) = &mut self.transaction {
            transaction.push(statement);
        } else {
            self.transaction_log.push(Transaction::one(statement));
        }
        if counter < self.exec_results.len() {
            let result =
                std::mem::replace(&mut self.exec_results[counter], Ok(MockExecResult::default()));
            result.map(|result| ExecResult {
                result: ExecResultHolder::Mock(result),
            })
        } else {
            Err(exec_err("`exec_results` buffer is empty."))
        }
    }

    fn query(&mut self, counter: usize, statement: Statement) -> Result<Vec<QueryResult>, DbErr> {
        if let Some(transaction) = &mut self.transaction {
            transaction.push(statement);
        } else {
            self.transaction_log.push(Transaction::one(statement));
        }
        if counter < self.query_results.len() {
            let result = std::mem::replace(&mut self.query_results[counter], Ok(Vec::new()));
            result.map(|rows| {
                rows.into_iter()
                    .map(|row| QueryResult {
                        row: QueryResultRow::Mock(row),
                    })
                    .collect()
            })
        } else {
            Err(query_err("`query_results` buffer is empty."))
        }
    }

    fn begin(&mut self) {
        if self.transaction.is_some() {
            self.transaction
                .as_mut()
                .expect("Open transaction")
                .begin_nested(self.db_backend);
        } else {
            self.transaction = Some(OpenTransaction::init(self.db_backend));
        }
    }

    fn commit(&mut self) {
        if self.transaction.is_some() {
            if self
                .transaction
                .as_mut()
                .expect("Open transaction")
                .commit(self.db_backend)
            {
                let transaction = self.transaction.take().expect("Open transaction");
                self.transaction_log.push(transaction.into_transaction());
            }
        } else {
            panic!("There is no open transaction to commit");
        }
    }

    fn rollback(&mut self) {
        if self.transaction.is_some() {
            if self
                .transaction
                .as_mut()
                .expect("Open transaction")
                .rollback(self.db_backend)
            {
                let transaction = self.transaction.take().expect("Open transaction");
                self.transaction_log.push(transaction.into_transaction());
            }
        } else {
            panic!("There is no open transaction to rollback");
        }
    }

    fn drain_transaction_log(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transaction_log)
    }

    fn get_database_backend(&self) -> DbBackend {
        self.db_backend
    }

    fn ping(&self) -> Result<(), DbErr> {
        Ok(())
    }
}

impl MockRow {
    /// Try to get the values of a [MockRow] and fail gracefully on error
    pub fn try_get<T, I: ColIdx>(&self, index: I) -> Result<T, DbErr>
    where
        T: ValueType,
    {
        if let Some(index) = index.as_str() {
            T::try_from(
                self.values
                    .get(index)
                    .ok_or_else(|| query_err(format!("No column for ColIdx {index:?}")))?
                    .clone(),
            )
            .map_err(|e| DbErr::Type(e.to_string()))
        } else if let Some(index) = index.as_usize() {
            Err(query_err(format!(
                "Mock database supports access by column name only, got index {index}"
            )))
        } else {
            unreachable!("Missing ColIdx implementation for MockRow");
        }
    }

    /// An iterator over the keys and values of a mock row
    pub fn into_column_value_tuples(self) -> impl Iterator<Item = (String, Value)> {
        self.values.into_iter()
    }
}

impl IntoMockRow for MockRow {
    fn into_mock_row(self) -> MockRow {
        self
    }
}

impl IntoMockRow for BTreeMap<&str, Value> {
    fn into_mock_row(self) -> MockRow {
        MockRow {
            values: self.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
        }
    }
}

impl IntoMockRow for BTreeMap<String, Value> {
    fn into_mock_row(self) -> MockRow {
        MockRow { values: self }
    }
}

impl Transaction {
    /// Create a [Transaction] with a single statement from its SQL and values
    pub fn from_sql_and_values<I>(db_backend: DbBackend, sql: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::one(Statement::from_string_values_tuple(
            db_backend,
            (sql.to_owned(), Values(values.into_iter().collect())),
        ))
    }

    /// Create a [Transaction] with one [Statement]
    pub fn one(stmt: Statement) -> Self {
        Self { stmts: vec![stmt] }
    }

    /// Create a [Transaction] with many [Statement]s
    pub fn many<I>(stmts: I) -> Self
    where
        I: IntoIterator<Item = Statement>,
    {
        Self {
            stmts: stmts.into_iter().collect(),
        }
    }

    /// Wrap each [Statement] as a [Transaction]
    pub fn wrap<I>(stmts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = Statement>,
    {
        stmts.into_iter().map(Self::one).collect()
    }
}

impl OpenTransaction {
    fn init(db_backend: DbBackend) -> Self {
        Self {
            stmts: vec![Statement::from_string(db_backend, "BEGIN")],
            transaction_depth: 0,
        }
    }

    fn begin_nested(&mut self, db_backend: DbBackend) {
        self.transaction_depth += 1;
        self.push(Statement::from_string(
            db_backend,
            format!("SAVEPOINT savepoint_{}", self.transaction_depth),
        ));
    }

    fn commit(&mut self, db_backend: DbBackend) -> bool {
        if self.transaction_depth == 0 {
            self.push(Statement::from_string(db_backend, "COMMIT"));
            true
        } else {
            self.push(Statement::from_string(
                db_backend,
                format!("RELEASE SAVEPOINT savepoint_{}", self.transaction_depth),
            ));
            self.transaction_depth -= 1;
            false
        }
    }

    fn rollback(&mut self, db_backend: DbBackend) -> bool {
        if self.transaction_depth == 0 {
            self.push(Statement::from_string(db_backend, "ROLLBACK"));
            true
        } else {
            self.push(Statement::from_string(
                db_backend,
                format!("ROLLBACK TO SAVEPOINT savepoint_{}", self.transaction_depth),
            ));
            self.transaction_depth -= 1;
            false
        }
    }

    fn push(&mut self, stmt: Statement) {
        self.stmts.push(stmt)
    }

    fn into_transaction(self) -> Transaction {
        if self.transaction_depth != 0 {
            panic!("There is uncommitted nested transaction");
        }
        Transaction { stmts: self.stmts }
    }
}
