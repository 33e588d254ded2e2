use crate::{
    DatabaseTransaction, DbBackend, DbErr, ExecResult, QueryResult, Statement, TransactionError,
};
use std::{future::Future, pin::Pin};

/// A handle the relation engine can run statements on. Pooled connections,
/// open transactions and the mock database all implement it, so capture and
/// sync code does not care which one it was given.
#[async_trait::async_trait]
pub trait ConnectionTrait: Sync {
    /// The SQL dialect statements are built for
    fn get_database_backend(&self) -> DbBackend;

    /// Run a [Statement] and report how many rows it touched
    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr>;

    /// Run a [Statement] and take the first row, if any
    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr>;

    /// Run a [Statement] and collect every row
    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr>;
}

/// Opens transactions on a connection.
///
/// An order capture and the sync that follows must run on one transaction;
/// this trait hands out [DatabaseTransaction] values scoped to a closure or
/// to explicit commit and rollback calls.
#[async_trait::async_trait]
pub trait TransactionTrait {
    /// Execute SQL `BEGIN` and return a transaction to commit or roll back
    async fn begin(&self) -> Result<DatabaseTransaction, DbErr>;

    /// Like [TransactionTrait::begin] with an isolation level and/or access mode
    async fn begin_with_config(
        &self,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<DatabaseTransaction, DbErr>;

    /// Run the closure inside a transaction, committing on `Ok` and rolling
    /// back on `Err`
    async fn transaction<F, T, E>(&self, callback: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::error::Error + Send;

    /// Like [TransactionTrait::transaction] with an isolation level and/or
    /// access mode
    async fn transaction_with_config<F, T, E>(
        &self,
        callback: F,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::error::Error + Send;
}

/// Isolation level of a transaction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Reads within the transaction see the snapshot taken by its first read
    RepeatableRead,
    /// Every read sees a fresh snapshot of committed data
    ReadCommitted,
    /// Reads may observe rows of transactions that never commit
    ReadUncommitted,
    /// The transaction only sees rows committed before it started
    Serializable,
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::ReadUncommitted => write!(f, "READ UNCOMMITTED"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
        }
    }
}

/// Access mode of a transaction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessMode {
    /// Statements in this transaction may not modify data
    ReadOnly,
    /// Statements in this transaction may modify data (default)
    ReadWrite,
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessMode::ReadOnly => write!(f, "READ ONLY"),
            AccessMode::ReadWrite => write!(f, "READ WRITE"),
        }
    }
}
