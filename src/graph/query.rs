//! Fluent builders for Cypher and SQL queries.

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream, SqlParams};
use crate::graph::traits::{CypherExecutor, SqlExecutor};

/// A builder for constructing and executing Cypher queries.
///
/// ```ignore
/// let rows = Query::new(&client, "MATCH (j:Journal) WHERE j.uri = $uri RETURN j.title AS title")
///     .param("uri", "https://example.org/journal/1234-5678")
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    cypher: String,
    params: Params,
    error: Option<AppError>,
}

impl<'a, E: CypherExecutor + ?Sized> Query<'a, E> {
    /// Creates a new query builder.
    pub fn new(executor: &'a E, cypher: &str) -> Self {
        Self {
            executor,
            cypher: cypher.to_string(),
            params: Params::new(),
            error: None,
        }
    }

    /// Adds a parameter to the query, referenced in Cypher as `$name`.
    ///
    /// A value that fails to serialize is reported when the query executes.
    pub fn param<T: Serialize>(mut self, name: &str, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(json_value) => {
                self.params.insert(name.to_string(), json_value);
            }
            Err(e) => {
                self.error.get_or_insert_with(|| {
                    AppError::Internal(format!("failed to serialize parameter '{}': {}", name, e))
                });
            }
        }
        self
    }

    /// Adds a parameter that's already a JSON value.
    pub fn param_raw(mut self, name: &str, value: JsonValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Executes the query and returns a stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.executor
            .execute_cypher(&self.cypher, self.params)
            .await
    }

    /// Executes the query and collects all rows into a vector.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the query and returns the first row, if any.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let mut stream = self.execute().await?;
        stream.next().await.transpose()
    }

    /// Executes the query without returning results.
    pub async fn run(self) -> Result<(), AppError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.executor.run_cypher(&self.cypher, self.params).await
    }
}

/// A builder for parametrized SQL queries.
///
/// Values are bound positionally in the order of [`bind`](SqlQuery::bind) calls.
///
/// ```ignore
/// let rows = SqlQuery::new(&client, "SELECT id FROM areas WHERE id = ANY($1)")
///     .bind(vec!["1700", "2600"])
///     .fetch_all()
///     .await?;
/// ```
pub struct SqlQuery<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
    sql: String,
    params: SqlParams,
    error: Option<AppError>,
}

impl<'a, E: SqlExecutor + ?Sized> SqlQuery<'a, E> {
    /// Creates a new SQL query builder.
    pub fn new(executor: &'a E, sql: &str) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            params: SqlParams::new(),
            error: None,
        }
    }

    /// Binds the next positional parameter.
    pub fn bind<T: Serialize>(mut self, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(json_value) => self.params.push(json_value),
            Err(e) => {
                self.error.get_or_insert_with(|| {
                    AppError::Internal(format!(
                        "failed to serialize SQL parameter ${}: {}",
                        self.params.len() + 1,
                        e
                    ))
                });
            }
        }
        self
    }

    /// Executes the query and returns a stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.executor.query_sql(&self.sql, self.params).await
    }

    /// Executes the query and collects all rows into a vector.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }
}

/// Extension trait providing a convenient `query()` method.
pub trait QueryExt: CypherExecutor {
    /// Creates a new Cypher query builder for this executor.
    fn query(&self, cypher: &str) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, cypher)
    }
}

// Blanket implementation for all CypherExecutor types
impl<E: CypherExecutor> QueryExt for E {}

/// Extension trait providing a convenient `sql()` method.
pub trait SqlQueryExt: SqlExecutor {
    /// Creates a new SQL query builder for this executor.
    fn sql(&self, sql: &str) -> SqlQuery<'_, Self>
    where
        Self: Sized,
    {
        SqlQuery::new(self, sql)
    }
}

impl<E: SqlExecutor> SqlQueryExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    // Mock executor checking what reaches the backend
    struct MockExecutor {
        expected_query: String,
        expected_params: Params,
        expected_sql_params: SqlParams,
    }

    #[async_trait::async_trait]
    impl CypherExecutor for MockExecutor {
        async fn execute_cypher(
            &self,
            cypher: &str,
            params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            assert_eq!(cypher, self.expected_query);
            assert_eq!(params, self.expected_params);
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
            assert_eq!(cypher, self.expected_query);
            assert_eq!(params, self.expected_params);
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl SqlExecutor for MockExecutor {
        async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
            assert_eq!(sql, self.expected_query);
            Ok(())
        }

        async fn query_sql(&self, sql: &str, params: SqlParams) -> Result<RowStream<'_>, AppError> {
            assert_eq!(sql, self.expected_query);
            assert_eq!(params, self.expected_sql_params);
            let row = Row::from_pairs([("area_id", json!("1700"))]);
            Ok(Box::pin(futures::stream::iter(vec![Ok(row)])))
        }
    }

    fn mock(query: &str) -> MockExecutor {
        MockExecutor {
            expected_query: query.to_string(),
            expected_params: HashMap::new(),
            expected_sql_params: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_query_no_params() {
        let executor = mock("MATCH (j:Journal) RETURN j.uri AS journal");

        let result = executor
            .query("MATCH (j:Journal) RETURN j.uri AS journal")
            .fetch_all()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_query_with_params() {
        let mut executor = mock("MATCH (j:Journal) WHERE j.license IN $licenses RETURN j.uri AS journal");
        executor
            .expected_params
            .insert("licenses".to_string(), json!(["CC BY", "CC0"]));

        let result = executor
            .query("MATCH (j:Journal) WHERE j.license IN $licenses RETURN j.uri AS journal")
            .param("licenses", vec!["CC BY", "CC0"])
            .fetch_all()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_sql_bind_order() {
        let mut executor = mock("SELECT area_id FROM category_areas WHERE category_id = ANY($1) AND area_id <> $2");
        executor.expected_sql_params = vec![json!(["COMP"]), json!("0000")];

        let rows = executor
            .sql("SELECT area_id FROM category_areas WHERE category_id = ANY($1) AND area_id <> $2")
            .bind(vec!["COMP"])
            .bind("0000")
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("area_id"), Some("1700"));
    }
}
