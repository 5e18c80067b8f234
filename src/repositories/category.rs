//! Category store over relational classification tables.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::{Row, SqlExecutor, SqlQueryExt};
use crate::repositories::{columns, text_set, CategoryStore};

const CATEGORY_LOOKUP: &str = "
    SELECT c.id AS category_id, jc.quartile, ca.area_id
    FROM categories c
    LEFT JOIN journal_categories jc ON jc.category_id = c.id
    LEFT JOIN category_areas ca ON ca.category_id = c.id
    WHERE c.id = $1
    ORDER BY jc.quartile NULLS LAST, ca.area_id";

const AREA_LOOKUP: &str = "
    SELECT a.id AS area_id, ca.category_id, jc.quartile
    FROM areas a
    LEFT JOIN category_areas ca ON ca.area_id = a.id
    LEFT JOIN journal_categories jc ON jc.category_id = ca.category_id
    WHERE a.id = $1
    ORDER BY ca.category_id, jc.quartile";

const ALL_CATEGORIES: &str = "
    SELECT DISTINCT c.id AS category_id, jc.quartile
    FROM categories c
    LEFT JOIN journal_categories jc ON jc.category_id = c.id
    ORDER BY 1, 2";

const ALL_AREAS: &str = "SELECT DISTINCT id AS area_id FROM areas ORDER BY 1";

const CATEGORIES_WITH_QUARTILE: &str = "
    SELECT DISTINCT c.id AS category_id, jc.quartile
    FROM categories c
    LEFT JOIN journal_categories jc ON jc.category_id = c.id
    WHERE cardinality($1::text[]) = 0 OR jc.quartile = ANY($1)
    ORDER BY 1, 2";

const CATEGORIES_IN_AREAS: &str = "
    SELECT DISTINCT c.id AS category_id, jc.quartile
    FROM categories c
    JOIN category_areas ca ON ca.category_id = c.id
    LEFT JOIN journal_categories jc ON jc.category_id = c.id
    WHERE cardinality($1::text[]) = 0 OR ca.area_id = ANY($1)
    ORDER BY 1, 2";

const AREAS_FOR_CATEGORIES: &str = "
    SELECT DISTINCT ca.area_id
    FROM category_areas ca
    WHERE cardinality($1::text[]) = 0 OR ca.category_id = ANY($1)
    ORDER BY 1";

const CATEGORIES_FOR_JOURNAL: &str = "
    SELECT DISTINCT jc.category_id, jc.quartile
    FROM journal_categories jc
    WHERE jc.journal_id = $1
    ORDER BY 1, 2";

const AREAS_FOR_JOURNAL: &str = "
    SELECT DISTINCT ca.area_id
    FROM journal_categories jc
    JOIN category_areas ca ON ca.category_id = jc.category_id
    WHERE jc.journal_id = $1
    ORDER BY 1";

const DISTINCT_CATEGORY_IDS: &str = "SELECT DISTINCT id AS category_id FROM categories";

const DISTINCT_QUARTILES: &str =
    "SELECT DISTINCT quartile FROM journal_categories WHERE quartile IS NOT NULL";

const JOURNALS_MATCHING: &str = "
    SELECT DISTINCT jc.journal_id
    FROM journal_categories jc
    WHERE (cardinality($1::text[]) = 0 OR jc.category_id = ANY($1))
      AND (cardinality($2::text[]) = 0 OR jc.quartile = ANY($2))";

const JOURNALS_IN_AREAS: &str = "
    SELECT DISTINCT jc.journal_id
    FROM journal_categories jc
    JOIN category_areas ca ON ca.category_id = jc.category_id
    WHERE cardinality($1::text[]) = 0 OR ca.area_id = ANY($1)";

const JOURNALS_IN_AREAS_MATCHING: &str = "
    SELECT DISTINCT jc.journal_id
    FROM journal_categories jc
    JOIN category_areas ca ON ca.category_id = jc.category_id
    WHERE (cardinality($1::text[]) = 0 OR ca.area_id = ANY($1))
      AND (cardinality($2::text[]) = 0 OR jc.category_id = ANY($2))
      AND (cardinality($3::text[]) = 0 OR jc.quartile = ANY($3))";

/// Category store backed by SQL tables.
///
/// Schema: `categories(id)`, `areas(id)`,
/// `journal_categories(journal_id, category_id, quartile)` and
/// `category_areas(category_id, area_id)`. Each call runs on its own
/// connection from the executor; nothing is held between calls.
pub struct SqlCategoryStore<S: SqlExecutor> {
    name: String,
    client: S,
}

impl<S: SqlExecutor> SqlCategoryStore<S> {
    pub fn new(name: impl Into<String>, client: S) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    pub fn client(&self) -> &S {
        &self.client
    }

    async fn rows_for_set(&self, sql: &str, set: &BTreeSet<String>) -> Result<Vec<Row>, AppError> {
        self.client.sql(sql).bind(set).fetch_all().await
    }
}

#[async_trait]
impl<S: SqlExecutor> CategoryStore for SqlCategoryStore<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_by_id(&self, id: &str) -> Result<Vec<Row>, AppError> {
        let rows = self.client.sql(CATEGORY_LOOKUP).bind(id).fetch_all().await?;
        if rows
            .first()
            .is_some_and(|row| row.text(columns::CATEGORY_ID).is_some())
        {
            return Ok(rows);
        }
        self.client.sql(AREA_LOOKUP).bind(id).fetch_all().await
    }

    async fn get_all_categories(&self) -> Result<Vec<Row>, AppError> {
        self.client.sql(ALL_CATEGORIES).fetch_all().await
    }

    async fn get_all_areas(&self) -> Result<Vec<Row>, AppError> {
        self.client.sql(ALL_AREAS).fetch_all().await
    }

    async fn get_categories_with_quartile_in(
        &self,
        quartiles: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        self.rows_for_set(CATEGORIES_WITH_QUARTILE, quartiles).await
    }

    async fn get_categories_in_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        self.rows_for_set(CATEGORIES_IN_AREAS, area_ids).await
    }

    async fn get_areas_for_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        self.rows_for_set(AREAS_FOR_CATEGORIES, category_ids).await
    }

    async fn categories_for_journal(&self, journal_id: &str) -> Result<Vec<Row>, AppError> {
        self.client
            .sql(CATEGORIES_FOR_JOURNAL)
            .bind(journal_id)
            .fetch_all()
            .await
    }

    async fn areas_for_journal(&self, journal_id: &str) -> Result<Vec<Row>, AppError> {
        self.client
            .sql(AREAS_FOR_JOURNAL)
            .bind(journal_id)
            .fetch_all()
            .await
    }

    async fn distinct_category_ids(&self) -> Result<BTreeSet<String>, AppError> {
        let rows = self.client.sql(DISTINCT_CATEGORY_IDS).fetch_all().await?;
        Ok(text_set(&rows, columns::CATEGORY_ID))
    }

    async fn distinct_quartiles(&self) -> Result<BTreeSet<String>, AppError> {
        let rows = self.client.sql(DISTINCT_QUARTILES).fetch_all().await?;
        Ok(text_set(&rows, columns::QUARTILE))
    }

    async fn journal_ids_matching(
        &self,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError> {
        let rows = self
            .client
            .sql(JOURNALS_MATCHING)
            .bind(category_ids)
            .bind(quartiles)
            .fetch_all()
            .await?;
        Ok(text_set(&rows, columns::JOURNAL_ID))
    }

    async fn journal_ids_in_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError> {
        let rows = self.rows_for_set(JOURNALS_IN_AREAS, area_ids).await?;
        Ok(text_set(&rows, columns::JOURNAL_ID))
    }

    async fn journal_ids_in_areas_matching(
        &self,
        area_ids: &BTreeSet<String>,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError> {
        let rows = self
            .client
            .sql(JOURNALS_IN_AREAS_MATCHING)
            .bind(area_ids)
            .bind(category_ids)
            .bind(quartiles)
            .fetch_all()
            .await?;
        Ok(text_set(&rows, columns::JOURNAL_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RowStream, SqlParams};
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers SQL by the first matching fragment and records the binds.
    struct ScriptedSql {
        answers: Vec<(&'static str, Vec<Row>)>,
        calls: Mutex<Vec<(String, SqlParams)>>,
    }

    impl ScriptedSql {
        fn new(answers: Vec<(&'static str, Vec<Row>)>) -> Self {
            Self {
                answers,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, SqlParams)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlExecutor for ScriptedSql {
        async fn execute_sql(&self, _sql: &str) -> Result<(), AppError> {
            Ok(())
        }

        async fn query_sql(&self, sql: &str, params: SqlParams) -> Result<RowStream<'_>, AppError> {
            self.calls.lock().unwrap().push((sql.to_string(), params));
            let rows = self
                .answers
                .iter()
                .find(|(fragment, _)| sql.contains(fragment))
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default();
            Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
        }
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_by_id_category_hit_skips_area_lookup() {
        let client = ScriptedSql::new(vec![(
            "FROM categories c",
            vec![Row::from_pairs([
                ("category_id", json!("COMP")),
                ("quartile", json!("Q1")),
                ("area_id", json!("1700")),
            ])],
        )]);
        let store = SqlCategoryStore::new("scimago", client);

        let rows = store.get_by_id("COMP").await.unwrap();

        assert_eq!(rows[0].text("category_id"), Some("COMP"));
        assert_eq!(store.client().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_falls_back_to_area_lookup() {
        let client = ScriptedSql::new(vec![(
            "FROM areas a",
            vec![Row::from_pairs([
                ("area_id", json!("1700")),
                ("category_id", json!("COMP")),
                ("quartile", json!(null)),
            ])],
        )]);
        let store = SqlCategoryStore::new("scimago", client);

        let rows = store.get_by_id("1700").await.unwrap();

        assert_eq!(rows[0].text("area_id"), Some("1700"));
        let calls = store.client().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, vec![json!("1700")]);
    }

    #[tokio::test]
    async fn test_three_way_join_binds_sets_in_order() {
        let client = ScriptedSql::new(vec![(
            "jc.quartile = ANY($3)",
            vec![
                Row::from_pairs([("journal_id", json!("1234-5678"))]),
                Row::from_pairs([("journal_id", json!("8765-4321"))]),
            ],
        )]);
        let store = SqlCategoryStore::new("scimago", client);

        let ids = store
            .journal_ids_in_areas_matching(&set(&["1700"]), &set(&["COMP"]), &set(&["Q1", "Q2"]))
            .await
            .unwrap();

        assert_eq!(ids, set(&["1234-5678", "8765-4321"]));
        let calls = store.client().calls();
        assert_eq!(
            calls[0].1,
            vec![json!(["1700"]), json!(["COMP"]), json!(["Q1", "Q2"])]
        );
    }

    #[tokio::test]
    async fn test_distinct_quartiles_skips_nulls() {
        let client = ScriptedSql::new(vec![(
            "SELECT DISTINCT quartile",
            vec![
                Row::from_pairs([("quartile", json!("Q1"))]),
                Row::from_pairs([("quartile", json!(null))]),
            ],
        )]);
        let store = SqlCategoryStore::new("scimago", client);

        assert_eq!(store.distinct_quartiles().await.unwrap(), set(&["Q1"]));
    }
}
