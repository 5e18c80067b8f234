//! Journal store over a property graph.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::cypher;
use crate::error::AppError;
use crate::graph::{CypherExecutor, QueryExt, Row};
use crate::repositories::{columns, text_set, JournalStore};

/// Projection shared by every journal query.
const JOURNAL_RETURN: &str = "RETURN j.uri AS uri, j.title AS title, j.languages AS language, \
     j.publisher AS publisher, j.license AS license, j.seal AS seal, j.apc AS apc \
     ORDER BY j.uri";

/// Journal store backed by `:Journal` vertices.
///
/// Vertex properties: `uri`, `title`, `identifiers` (list), `languages`
/// (list), `publisher`, `license`, `seal`, `apc`.
pub struct GraphJournalStore<C: CypherExecutor> {
    name: String,
    client: C,
}

impl<C: CypherExecutor> GraphJournalStore<C> {
    pub fn new(name: impl Into<String>, client: C) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn journals_where(predicate: &str) -> String {
        format!("MATCH (j:Journal) WHERE {} {}", predicate, JOURNAL_RETURN)
    }
}

#[async_trait]
impl<C: CypherExecutor> JournalStore for GraphJournalStore<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_by_id(&self, id: &str) -> Result<Vec<Row>, AppError> {
        let query = Self::journals_where("$id IN j.identifiers OR j.uri ENDS WITH $suffix");
        cypher!(self.client, &query, id = id, suffix = format!("/{}", id))
            .fetch_all()
            .await
    }

    async fn get_all(&self) -> Result<Vec<Row>, AppError> {
        let query = format!("MATCH (j:Journal) {}", JOURNAL_RETURN);
        self.client.query(&query).fetch_all().await
    }

    async fn get_with_title_containing(&self, text: &str) -> Result<Vec<Row>, AppError> {
        let query = Self::journals_where("toLower(j.title) CONTAINS toLower($text)");
        cypher!(self.client, &query, text = text).fetch_all().await
    }

    async fn get_published_by(&self, text: &str) -> Result<Vec<Row>, AppError> {
        let query = Self::journals_where(
            "j.publisher IS NOT NULL AND toLower(j.publisher) CONTAINS toLower($text)",
        );
        cypher!(self.client, &query, text = text).fetch_all().await
    }

    async fn get_with_license_in(
        &self,
        licenses: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        if licenses.is_empty() {
            return self.get_all().await;
        }
        let query = Self::journals_where("j.license IN $licenses");
        cypher!(self.client, &query, licenses = licenses)
            .fetch_all()
            .await
    }

    async fn get_with_apc(&self) -> Result<Vec<Row>, AppError> {
        let query = Self::journals_where("j.apc = true");
        self.client.query(&query).fetch_all().await
    }

    async fn get_with_doaj_seal(&self) -> Result<Vec<Row>, AppError> {
        let query = Self::journals_where("j.seal = true");
        self.client.query(&query).fetch_all().await
    }

    async fn get_distinct_licenses(&self) -> Result<BTreeSet<String>, AppError> {
        let rows = self
            .client
            .query(
                "MATCH (j:Journal) WHERE j.license IS NOT NULL
                 RETURN DISTINCT j.license AS license",
            )
            .fetch_all()
            .await?;
        Ok(text_set(&rows, columns::LICENSE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Params, RowStream};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every query and answers with canned rows.
    struct Recorder {
        calls: Mutex<Vec<(String, Params)>>,
        rows: Vec<Row>,
    }

    impl Recorder {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                rows,
            }
        }

        fn last_call(&self) -> (String, Params) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CypherExecutor for Recorder {
        async fn execute_cypher(
            &self,
            cypher: &str,
            params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            self.calls.lock().unwrap().push((cypher.to_string(), params));
            Ok(Box::pin(futures::stream::iter(
                self.rows.clone().into_iter().map(Ok),
            )))
        }

        async fn run_cypher(&self, _cypher: &str, _params: Params) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_get_by_id_matches_identifier_or_uri_suffix() {
        let store = GraphJournalStore::new("doaj", Recorder::new(vec![]));

        store.get_by_id("1234-5678").await.unwrap();

        let (query, params) = store.client().last_call();
        assert!(query.contains("$id IN j.identifiers"));
        assert!(query.contains("RETURN j.uri AS uri"));
        assert_eq!(params["id"], json!("1234-5678"));
        assert_eq!(params["suffix"], json!("/1234-5678"));
    }

    #[tokio::test]
    async fn test_title_filter_is_parametrized() {
        let store = GraphJournalStore::new("doaj", Recorder::new(vec![]));

        store.get_with_title_containing("o'brien").await.unwrap();

        let (query, params) = store.client().last_call();
        assert!(!query.contains("o'brien"));
        assert!(query.contains("toLower(j.title) CONTAINS toLower($text)"));
        assert_eq!(params["text"], json!("o'brien"));
    }

    #[tokio::test]
    async fn test_license_filter_binds_list() {
        let store = GraphJournalStore::new("doaj", Recorder::new(vec![]));
        let licenses: BTreeSet<String> = ["CC BY".to_string(), "CC0".to_string()].into();

        store.get_with_license_in(&licenses).await.unwrap();

        let (query, params) = store.client().last_call();
        assert!(query.contains("j.license IN $licenses"));
        assert_eq!(params["licenses"], json!(["CC BY", "CC0"]));
    }

    #[tokio::test]
    async fn test_empty_license_set_is_unrestricted() {
        let store = GraphJournalStore::new("doaj", Recorder::new(vec![]));

        store.get_with_license_in(&BTreeSet::new()).await.unwrap();

        let (query, params) = store.client().last_call();
        assert!(!query.contains("WHERE"));
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_licenses() {
        let rows = vec![
            Row::from_pairs([("license", json!("CC BY"))]),
            Row::from_pairs([("license", json!("CC BY-SA"))]),
        ];
        let store = GraphJournalStore::new("doaj", Recorder::new(rows));

        let licenses = store.get_distinct_licenses().await.unwrap();

        assert_eq!(licenses.len(), 2);
        assert!(licenses.contains("CC BY-SA"));
    }
}
