//! Core traits for database access.
//!
//! - [`CypherExecutor`] - Cypher queries against a graph (journal stores)
//! - [`SqlExecutor`] - parametrized SQL (category stores, migrations)
//! - [`Transaction`] - Transaction lifecycle management
//! - [`GraphClient`] - Connection pool and transaction creation

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream, SqlParams};

/// Executes Cypher queries against a graph database.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a Cypher query and returns a stream of result rows.
    ///
    /// # Arguments
    ///
    /// * `cypher` - The Cypher query string
    /// * `params` - Parameters to bind to the query
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a Cypher query without returning results.
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

/// Executes SQL statements against the database.
///
/// Query values are always bound as parameters, never spliced into the
/// statement text.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes one or more SQL statements without returning results.
    ///
    /// Use this for DDL (CREATE TABLE, CREATE INDEX).
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError>;

    /// Executes a parametrized SQL query and returns a stream of result rows.
    async fn query_sql(&self, sql: &str, params: SqlParams) -> Result<RowStream<'_>, AppError>;
}

/// Transaction lifecycle management.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits the transaction, making all changes permanent.
    async fn commit(self) -> Result<(), AppError>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self) -> Result<(), AppError>;
}

/// A database client that can begin transactions.
///
/// Implementations wrap a connection pool; plain executor calls run in
/// auto-commit mode on a connection checked out for that call only.
#[async_trait]
pub trait GraphClient: CypherExecutor + SqlExecutor {
    /// The transaction type returned by this client.
    type Tx<'a>: Transaction + CypherExecutor + SqlExecutor
    where
        Self: 'a;

    /// Begins a new transaction.
    ///
    /// ```ignore
    /// let txn = client.begin().await?;
    /// txn.execute_sql("CREATE TABLE IF NOT EXISTS areas (id TEXT PRIMARY KEY)").await?;
    /// txn.commit().await?;
    /// ```
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}
