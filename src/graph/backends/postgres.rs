//! PostgreSQL backend, with Apache AGE for Cypher.
//!
//! One client type serves both store kinds: journal stores run Cypher
//! against an AGE graph, category stores run plain parametrized SQL.
//!
//! Every auto-commit call checks a connection out of the pool for the
//! duration of that call only. The connection goes back to the pool when
//! the call's stream is dropped, on success and on error alike.
//!
//! ```ignore
//! use bibliofed::graph::backends::postgres::PostgresClient;
//! use bibliofed::graph::QueryExt;
//!
//! let client = PostgresClient::connect("postgresql://localhost/bibliofed", "journals").await?;
//! let rows = client.query("MATCH (j:Journal) RETURN j.uri AS journal").fetch_all().await?;
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value as JsonValue;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::NoTls;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream, SqlParams};
use crate::graph::traits::{CypherExecutor, GraphClient, SqlExecutor, Transaction};

/// Maximum pooled connections per client.
const POOL_SIZE: usize = 16;

// ----------------------------------------------------------------------------
// Agtype wrapper for AGE parameter binding
// ----------------------------------------------------------------------------

/// AGE `agtype` parameter value.
///
/// AGE's `cypher()` function takes its parameter map as `agtype`, whose
/// binary format is a version byte followed by JSON text. Parameters travel
/// through the extended query protocol and are never interpolated into the
/// Cypher text.
#[derive(Debug, Clone)]
struct Agtype(String);

impl ToSql for Agtype {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.extend_from_slice(&[1]);
        out.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        // OID varies per installation
        ty.name() == "agtype"
    }

    to_sql_checked!();
}

/// agtype result value, decoded to JSON.
#[derive(Debug)]
struct AgtypeValue(JsonValue);

impl<'a> tokio_postgres::types::FromSql<'a> for AgtypeValue {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if raw.is_empty() {
            return Ok(AgtypeValue(JsonValue::Null));
        }

        let json_bytes = if raw[0] == 1 { &raw[1..] } else { raw };
        let json_str = std::str::from_utf8(json_bytes)?;

        let clean_json = json_str
            .trim_end_matches("::vertex")
            .trim_end_matches("::edge")
            .trim_end_matches("::path");

        Ok(AgtypeValue(serde_json::from_str(clean_json)?))
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "agtype"
    }
}

// ----------------------------------------------------------------------------
// Client
// ----------------------------------------------------------------------------

/// Pooled PostgreSQL client.
///
/// Cheap to clone; the pool is shared.
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
    graph_name: Option<Arc<str>>,
}

impl PostgresClient {
    /// Creates a client with connection pooling.
    ///
    /// `graph_name` is the AGE graph Cypher queries run against.
    pub async fn connect(connection_string: &str, graph_name: &str) -> Result<Self, AppError> {
        Ok(Self {
            pool: build_pool(connection_string)?,
            graph_name: Some(Arc::from(graph_name)),
        })
    }

    /// Creates a pooled client for plain SQL.
    ///
    /// AGE is never loaded; Cypher calls fail with [`AppError::Validation`].
    pub async fn connect_sql(connection_string: &str) -> Result<Self, AppError> {
        Ok(Self {
            pool: build_pool(connection_string)?,
            graph_name: None,
        })
    }

    /// Returns the AGE graph name, if this client has one.
    pub fn graph_name(&self) -> Option<&str> {
        self.graph_name.as_deref()
    }

    /// Checks out a plain connection.
    async fn checkout(&self) -> Result<Object, AppError> {
        self.pool.get().await.map_err(|e| {
            AppError::Internal(format!("Failed to get connection from pool: {}", e))
        })
    }

    /// Checks out a connection with the AGE session loaded.
    async fn checkout_age(&self) -> Result<Object, AppError> {
        let conn = self.checkout().await?;
        load_age(&conn).await?;
        Ok(conn)
    }

    /// Ensures the AGE graph exists, creating it if necessary.
    pub async fn ensure_graph_exists(&self) -> Result<(), AppError> {
        let graph_name: &str = require_graph(&self.graph_name)?;
        let conn = self.checkout_age().await?;

        let exists = conn
            .query_opt(
                "SELECT 1 FROM ag_catalog.ag_graph WHERE name = $1",
                &[&graph_name],
            )
            .await
            .map_err(|e| AppError::Internal(format!("Failed to look up graph: {}", e)))?
            .is_some();

        if !exists {
            conn.execute(
                "SELECT ag_catalog.create_graph($1)",
                &[&graph_name],
            )
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create graph: {}", e)))?;
            tracing::info!(graph = %graph_name, "Created AGE graph");
        }

        Ok(())
    }
}

#[async_trait]
impl CypherExecutor for PostgresClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let graph_name = require_graph(&self.graph_name)?.clone();
        let conn = self.checkout_age().await?;
        execute_pg_cypher_owned(conn, graph_name, cypher.to_string(), params)
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        drain(self.execute_cypher(cypher, params).await?).await
    }
}

#[async_trait]
impl SqlExecutor for PostgresClient {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        let conn = self.checkout().await?;
        batch_execute(&conn, sql).await
    }

    async fn query_sql(&self, sql: &str, params: SqlParams) -> Result<RowStream<'_>, AppError> {
        let conn = self.checkout().await?;
        let rows = query_pg_sql(&conn, sql, &params).await?;
        // conn is released here, before the caller consumes the rows
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }
}

#[async_trait]
impl GraphClient for PostgresClient {
    type Tx<'a> = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let conn = self.checkout().await?;

        conn.batch_execute("BEGIN")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to begin transaction: {}", e)))?;

        Ok(PostgresTransaction {
            conn,
            graph_name: self.graph_name.clone(),
            age_loaded: AtomicBool::new(false),
            finished: false,
        })
    }
}

// ----------------------------------------------------------------------------
// Transaction
// ----------------------------------------------------------------------------

/// A pooled connection with an open transaction.
///
/// Must be committed or rolled back explicitly; dropping it unfinished logs
/// a warning. AGE is loaded on the first Cypher statement, so SQL-only
/// transactions work on databases without the extension.
pub struct PostgresTransaction {
    conn: Object,
    graph_name: Option<Arc<str>>,
    age_loaded: AtomicBool,
    finished: bool,
}

#[async_trait]
impl CypherExecutor for PostgresTransaction {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let graph_name = require_graph(&self.graph_name)?;
        if !self.age_loaded.swap(true, Ordering::SeqCst) {
            load_age(&self.conn).await?;
        }
        let (sql, agtype_param) = build_age_query(graph_name, cypher, &params)?;
        let rows = match &agtype_param {
            None => self.conn.query(sql.as_str(), &[]).await,
            Some(param) => self.conn.query(sql.as_str(), &[param]).await,
        }
        .map_err(|e| cypher_error(e, cypher))?;

        Ok(Box::pin(futures::stream::iter(
            rows.into_iter().map(|row| Ok(parse_pg_row(&row))).collect::<Vec<_>>(),
        )))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        drain(self.execute_cypher(cypher, params).await?).await
    }
}

#[async_trait]
impl SqlExecutor for PostgresTransaction {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        batch_execute(&self.conn, sql).await
    }

    async fn query_sql(&self, sql: &str, params: SqlParams) -> Result<RowStream<'_>, AppError> {
        let rows = query_pg_sql(&self.conn, sql, &params).await?;
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(mut self) -> Result<(), AppError> {
        self.finished = true;
        self.conn
            .batch_execute("COMMIT")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(mut self) -> Result<(), AppError> {
        self.finished = true;
        self.conn
            .batch_execute("ROLLBACK")
            .await
            .map_err(|e| AppError::Internal(format!("Failed to rollback transaction: {}", e)))
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                "PostgresTransaction dropped without commit or rollback - connection state undefined"
            );
        }
    }
}

// ----------------------------------------------------------------------------
// Execution helpers
// ----------------------------------------------------------------------------

/// Builds a connection pool; connections open lazily on checkout.
fn build_pool(connection_string: &str) -> Result<Pool, AppError> {
    let pg_config: tokio_postgres::Config = connection_string.parse().map_err(|e| {
        AppError::Internal(format!("Invalid PostgreSQL connection string: {}", e))
    })?;

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
    Pool::builder(mgr)
        .max_size(POOL_SIZE)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create connection pool: {}", e)))
}

fn require_graph(graph_name: &Option<Arc<str>>) -> Result<&Arc<str>, AppError> {
    graph_name.as_ref().ok_or_else(|| {
        AppError::Validation("Cypher needs an AGE graph; this client is SQL-only".to_string())
    })
}

async fn load_age(conn: &Object) -> Result<(), AppError> {
    conn.batch_execute("LOAD 'age'; SET search_path = ag_catalog, public;")
        .await
        .map_err(|e| AppError::Internal(format!("Failed to initialize AGE session: {}", e)))
}

async fn drain(mut stream: RowStream<'_>) -> Result<(), AppError> {
    while let Some(result) = stream.next().await {
        result?;
    }
    Ok(())
}

fn db_error_detail(e: &tokio_postgres::Error) -> String {
    e.as_db_error()
        .map(|db_err| {
            format!(
                "{}: {} ({})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            )
        })
        .unwrap_or_else(|| e.to_string())
}

fn cypher_error(e: tokio_postgres::Error, cypher: &str) -> AppError {
    AppError::Query {
        message: format!("Cypher query failed: {}", db_error_detail(&e)),
        query: cypher.to_string(),
    }
}

async fn batch_execute(conn: &Object, sql: &str) -> Result<(), AppError> {
    conn.batch_execute(sql).await.map_err(|e| AppError::Query {
        message: format!("SQL execution failed: {}", db_error_detail(&e)),
        query: sql.to_string(),
    })
}

async fn query_pg_sql(conn: &Object, sql: &str, params: &SqlParams) -> Result<Vec<Row>, AppError> {
    let values = bind_sql_params(params)?;
    let refs: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();

    let rows = conn.query(sql, &refs).await.map_err(|e| AppError::Query {
        message: format!("SQL query failed: {}", db_error_detail(&e)),
        query: sql.to_string(),
    })?;

    Ok(rows.iter().map(parse_pg_row).collect())
}

/// Converts JSON parameters into typed PostgreSQL values.
fn bind_sql_params(params: &SqlParams) -> Result<Vec<Box<dyn ToSql + Sync + Send>>, AppError> {
    params
        .iter()
        .enumerate()
        .map(|(idx, value)| -> Result<Box<dyn ToSql + Sync + Send>, AppError> {
            match value {
                JsonValue::Null => Ok(Box::new(None::<String>)),
                JsonValue::Bool(b) => Ok(Box::new(*b)),
                JsonValue::String(s) => Ok(Box::new(s.clone())),
                JsonValue::Number(n) => n
                    .as_i64()
                    .map(|i| Box::new(i) as Box<dyn ToSql + Sync + Send>)
                    .ok_or_else(|| {
                        AppError::Validation(format!("SQL parameter ${} is not an integer", idx + 1))
                    }),
                JsonValue::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<String>>>()
                    .map(|texts| Box::new(texts) as Box<dyn ToSql + Sync + Send>)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "SQL parameter ${} must be an array of strings",
                            idx + 1
                        ))
                    }),
                JsonValue::Object(_) => Err(AppError::Validation(format!(
                    "SQL parameter ${} cannot be an object",
                    idx + 1
                ))),
            }
        })
        .collect()
}

/// Runs a Cypher query on an owned connection, keeping it alive for the stream.
fn execute_pg_cypher_owned(
    conn: Object,
    graph_name: Arc<str>,
    cypher: String,
    params: Params,
) -> Result<RowStream<'static>, AppError> {
    use async_stream::try_stream;

    let (sql, agtype_param) = build_age_query(&graph_name, &cypher, &params)?;

    Ok(Box::pin(try_stream! {
        let stream = match &agtype_param {
            None => conn.query_raw::<_, &Agtype, _>(&sql, std::iter::empty()).await,
            Some(param) => conn.query_raw(&sql, std::iter::once(param)).await,
        };
        let stream = stream.map_err(|e| cypher_error(e, &cypher))?;

        futures::pin_mut!(stream);
        while let Some(pg_row) = stream.try_next().await.map_err(|e| {
            AppError::Internal(format!("Failed to fetch row: {}", e))
        })? {
            yield parse_pg_row(&pg_row);
        }
    }))
}

/// Wraps a Cypher statement in AGE's `cypher()` SQL function.
///
/// AGE needs one `agtype` column definition per RETURN item, so the column
/// names are taken from the statement itself. Statements without RETURN get
/// a single placeholder column.
fn build_age_query(
    graph_name: &str,
    cypher: &str,
    params: &Params,
) -> Result<(String, Option<Agtype>), AppError> {
    use crate::graph::cypher::{extract_return_columns, ParseError};

    let columns_sql = match extract_return_columns(cypher) {
        Ok(columns) => columns
            .iter()
            // Always quoted: "count" and friends are reserved in PostgreSQL
            .map(|name| format!("\"{}\" agtype", name.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", "),
        Err(ParseError::NoReturnClause) => "result agtype".to_string(),
        Err(err) => return Err(AppError::Internal(format!("Cypher parse error: {}", err))),
    };

    if params.is_empty() {
        let sql = format!(
            "SELECT * FROM cypher('{}', $$ {} $$) as ({})",
            graph_name, cypher, columns_sql
        );
        Ok((sql, None))
    } else {
        let sql = format!(
            "SELECT * FROM cypher('{}', $$ {} $$, $1) as ({})",
            graph_name, cypher, columns_sql
        );
        let params_json = serde_json::to_string(params)
            .map_err(|e| AppError::Internal(format!("Failed to serialize parameters: {}", e)))?;
        Ok((sql, Some(Agtype(params_json))))
    }
}

/// Converts a PostgreSQL row into a generic [`Row`].
fn parse_pg_row(pg_row: &tokio_postgres::Row) -> Row {
    let mut data = HashMap::new();

    for (idx, column) in pg_row.columns().iter().enumerate() {
        data.insert(column.name().to_string(), pg_value(pg_row, idx, column.type_()));
    }

    Row::new(data)
}

fn pg_value(pg_row: &tokio_postgres::Row, idx: usize, col_type: &Type) -> JsonValue {
    match col_type.name() {
        "agtype" => pg_row
            .try_get::<_, AgtypeValue>(idx)
            .ok()
            .map(|v| v.0),
        "int2" => pg_row.try_get::<_, i16>(idx).ok().map(JsonValue::from),
        "int4" => pg_row.try_get::<_, i32>(idx).ok().map(JsonValue::from),
        "int8" => pg_row.try_get::<_, i64>(idx).ok().map(JsonValue::from),
        "bool" => pg_row.try_get::<_, bool>(idx).ok().map(JsonValue::Bool),
        "json" | "jsonb" => pg_row.try_get::<_, JsonValue>(idx).ok(),
        "_text" => pg_row
            .try_get::<_, Vec<String>>(idx)
            .ok()
            .map(JsonValue::from),
        // text, varchar, name, bpchar, and anything else readable as text
        _ => pg_row.try_get::<_, String>(idx).ok().map(JsonValue::String),
    }
    .unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_age_query_no_params() {
        let (sql, agtype_param) = build_age_query(
            "journals",
            "MATCH (j:Journal) RETURN j.uri AS journal",
            &Params::new(),
        )
        .unwrap();

        assert_eq!(
            sql,
            "SELECT * FROM cypher('journals', $$ MATCH (j:Journal) RETURN j.uri AS journal $$) as (\"journal\" agtype)"
        );
        assert!(agtype_param.is_none());
    }

    #[test]
    fn test_build_age_query_with_params() {
        let mut params = Params::new();
        params.insert("id".to_string(), json!("1234-5678"));

        let (sql, agtype_param) = build_age_query(
            "journals",
            "MATCH (j:Journal) WHERE $id IN j.identifiers RETURN j.uri AS journal, j.title AS title",
            &params,
        )
        .unwrap();

        assert!(sql.contains("$$, $1) as (\"journal\" agtype, \"title\" agtype)"));
        let param = agtype_param.expect("Should have agtype param");
        assert!(param.0.contains("1234-5678"));
    }

    #[test]
    fn test_build_age_query_no_return_clause() {
        let (sql, _) =
            build_age_query("journals", "CREATE (j:Journal {uri: 'x'})", &Params::new()).unwrap();

        assert!(sql.ends_with("as (result agtype)"));
    }

    #[test]
    fn test_build_age_query_rejects_return_star() {
        let result = build_age_query("journals", "MATCH (j) RETURN *", &Params::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_bind_sql_params_types() {
        let values = bind_sql_params(&vec![
            json!("Q1"),
            json!(["COMP", "MATH"]),
            json!(true),
            json!(7),
            JsonValue::Null,
        ])
        .unwrap();
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn test_bind_sql_params_rejects_mixed_array() {
        let result = bind_sql_params(&vec![json!(["COMP", 1])]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_bind_sql_params_rejects_object() {
        let result = bind_sql_params(&vec![json!({"a": 1})]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    // Pools are lazy, so no server is needed for either client.
    const NOWHERE: &str = "postgresql://postgres@127.0.0.1:1/none";

    #[tokio::test]
    async fn test_sql_only_client_rejects_cypher() {
        let client = PostgresClient::connect_sql(NOWHERE).await.unwrap();
        assert_eq!(client.graph_name(), None);

        let result = client
            .execute_cypher("MATCH (j:Journal) RETURN j.uri AS uri", Params::new())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = client.ensure_graph_exists().await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_graph_client_keeps_graph_name() {
        let client = PostgresClient::connect(NOWHERE, "journals").await.unwrap();
        assert_eq!(client.graph_name(), Some("journals"));
    }
}
