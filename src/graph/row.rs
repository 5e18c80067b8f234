//! Row and streaming types for query results.

use crate::error::AppError;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::pin::Pin;

/// Named parameters for Cypher queries, referenced as `$name`.
pub type Params = HashMap<String, JsonValue>;

/// Positional parameters for SQL queries, bound to `$1`, `$2`, ...
///
/// Strings bind as `text`, arrays of strings as `text[]`, booleans as `bool`,
/// integers as `int8`, and `null` as a null `text`.
pub type SqlParams = Vec<JsonValue>;

/// A stream of rows from a query result.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<Row, AppError>> + Send + 'a>>;

/// A single flat row from a query result.
///
/// Contains column values as JSON, with typed extraction via [`Row::get`].
/// Both store kinds return their results as rows; the engine turns them
/// into domain objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    data: HashMap<String, JsonValue>,
}

impl Row {
    /// Creates a new row from a map of column names to values.
    pub fn new(data: HashMap<String, JsonValue>) -> Self {
        Self { data }
    }

    /// Builds a row from `(column, value)` pairs.
    ///
    /// ```ignore
    /// let row = Row::from_pairs([("category_id", json!("COMP")), ("quartile", json!("Q1"))]);
    /// ```
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsonValue)>,
    {
        Self {
            data: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Gets a value from the row by column name, deserializing to the requested type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not found or if deserialization fails.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        self.data
            .get(key)
            .ok_or_else(|| AppError::Internal(format!("column not found: {}", key)))
            .and_then(|v| {
                serde_json::from_value(v.clone()).map_err(|e| {
                    AppError::Internal(format!("failed to deserialize '{}': {}", key, e))
                })
            })
    }

    /// Gets a value from the row, returning `None` if the key doesn't exist or is null.
    ///
    /// Still returns an error if the key exists but deserialization fails.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.data.get(key) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| AppError::Internal(format!("failed to deserialize '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    /// Gets a column as text, if present and a string.
    ///
    /// Unlike [`Row::get_opt`] this never fails: non-string values read as `None`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }

    /// Returns the raw JSON value for a column, if it exists.
    pub fn get_raw(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(|s| s.as_str())
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the row and returns the underlying data map.
    pub fn into_inner(self) -> HashMap<String, JsonValue> {
        self.data
    }
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(data: HashMap<String, JsonValue>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_get_string() {
        let row = Row::from_pairs([("title", json!("Journal of Tests"))]);

        let title: String = row.get("title").unwrap();
        assert_eq!(title, "Journal of Tests");
    }

    #[test]
    fn test_row_get_missing_key() {
        let row = Row::default();
        let result: Result<String, _> = row.get("missing");
        assert!(result.is_err());
    }

    #[test]
    fn test_row_get_opt_null() {
        let row = Row::from_pairs([("quartile", JsonValue::Null)]);

        let quartile: Option<String> = row.get_opt("quartile").unwrap();
        assert_eq!(quartile, None);
    }

    #[test]
    fn test_row_get_opt_wrong_type_errors() {
        let row = Row::from_pairs([("quartile", json!(1))]);
        let result: Result<Option<String>, _> = row.get_opt("quartile");
        assert!(result.is_err());
    }

    #[test]
    fn test_row_text_ignores_non_strings() {
        let row = Row::from_pairs([("apc", json!(true)), ("licence", json!("CC BY"))]);

        assert_eq!(row.text("apc"), None);
        assert_eq!(row.text("licence"), Some("CC BY"));
        assert_eq!(row.text("absent"), None);
    }

    #[test]
    fn test_row_columns() {
        let row = Row::from_pairs([("a", json!(1)), ("b", json!(2))]);

        let mut columns: Vec<_> = row.columns().collect();
        columns.sort();
        assert_eq!(columns, vec!["a", "b"]);
    }
}
