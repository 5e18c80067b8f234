//! Query federation engine.
//!
//! [`QueryEngine`] holds any number of journal stores and category stores
//! and answers domain queries by asking each registered store in turn,
//! in registration order, one call at a time. Results from different
//! stores are concatenated as-is; the engine never de-duplicates across
//! stores.
//!
//! ```ignore
//! use std::sync::Arc;
//! use bibliofed::engine::QueryEngine;
//!
//! let mut engine = QueryEngine::new();
//! engine.add_journal_store(Arc::new(journals));
//! engine.add_category_store(Arc::new(classification));
//!
//! let diamond = engine
//!     .get_diamond_journals_in_areas_and_categories_with_quartile(&areas, &categories, &quartiles)
//!     .await?;
//! ```

mod composite;
mod hydrate;
mod queries;
mod resolve;

use std::sync::Arc;

use serde::Deserialize;

use crate::error::AppError;
use crate::repositories::{CategoryStore, JournalStore};

/// What the engine does when a store call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and carry on as if the store returned nothing.
    #[default]
    Degrade,
    /// Abort the query with [`AppError::StoreUnavailable`].
    Propagate,
}

/// Federates queries over registered journal and category stores.
#[derive(Default)]
pub struct QueryEngine {
    journal_stores: Vec<Arc<dyn JournalStore>>,
    category_stores: Vec<Arc<dyn CategoryStore>>,
    failure_policy: FailurePolicy,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Registers a journal store. Returns `true` once registered.
    pub fn add_journal_store(&mut self, store: Arc<dyn JournalStore>) -> bool {
        tracing::debug!(store = store.name(), "Registered journal store");
        self.journal_stores.push(store);
        true
    }

    /// Registers a category store. Returns `true` once registered.
    pub fn add_category_store(&mut self, store: Arc<dyn CategoryStore>) -> bool {
        tracing::debug!(store = store.name(), "Registered category store");
        self.category_stores.push(store);
        true
    }

    /// Removes every journal store.
    pub fn clear_journal_stores(&mut self) -> bool {
        self.journal_stores.clear();
        true
    }

    /// Removes every category store.
    pub fn clear_category_stores(&mut self) -> bool {
        self.category_stores.clear();
        true
    }

    pub fn journal_stores(&self) -> &[Arc<dyn JournalStore>] {
        &self.journal_stores
    }

    pub fn category_stores(&self) -> &[Arc<dyn CategoryStore>] {
        &self.category_stores
    }

    /// Applies the failure policy to one store call's outcome.
    fn settle<T: Default>(
        &self,
        store: &str,
        operation: &'static str,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => match self.failure_policy {
                FailurePolicy::Degrade => {
                    tracing::warn!(
                        store,
                        operation,
                        error = %err,
                        "Store call failed; continuing with an empty result"
                    );
                    Ok(T::default())
                }
                FailurePolicy::Propagate => Err(AppError::unavailable(store, err)),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BrokenStore;
    use super::*;
    use crate::repositories::{InMemoryCategoryStore, InMemoryJournalStore};

    #[test]
    fn test_registry_add_and_clear() {
        let mut engine = QueryEngine::new();

        assert!(engine.add_journal_store(Arc::new(InMemoryJournalStore::new("a", vec![]))));
        assert!(engine.add_journal_store(Arc::new(InMemoryJournalStore::new("b", vec![]))));
        assert!(engine.add_category_store(Arc::new(InMemoryCategoryStore::new("c", vec![]))));
        assert_eq!(engine.journal_stores().len(), 2);
        assert_eq!(engine.category_stores().len(), 1);

        assert!(engine.clear_journal_stores());
        assert!(engine.journal_stores().is_empty());
        assert_eq!(engine.category_stores().len(), 1);

        assert!(engine.clear_category_stores());
        assert!(engine.category_stores().is_empty());
    }

    #[test]
    fn test_default_policy_is_degrade() {
        assert_eq!(QueryEngine::new().failure_policy(), FailurePolicy::Degrade);
    }

    #[test]
    fn test_failure_policy_deserializes_lowercase() {
        let policy: FailurePolicy = serde_json::from_str("\"propagate\"").unwrap();
        assert_eq!(policy, FailurePolicy::Propagate);
        assert!(serde_json::from_str::<FailurePolicy>("\"Propagate\"").is_err());
    }

    #[tokio::test]
    async fn test_degrade_turns_failure_into_empty_result() {
        let mut engine = QueryEngine::new();
        engine.add_journal_store(Arc::new(BrokenStore));
        engine.add_category_store(Arc::new(BrokenStore));

        assert!(engine.get_all_journals().await.unwrap().is_empty());
        assert!(engine.get_all_areas().await.unwrap().is_empty());
        assert!(engine.get_entity_by_id("1234-5678").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_propagate_reports_unavailable_store() {
        let mut engine = QueryEngine::new().with_failure_policy(FailurePolicy::Propagate);
        engine.add_journal_store(Arc::new(BrokenStore));

        let err = engine.get_all_journals().await.unwrap_err();
        match err {
            AppError::StoreUnavailable { store, message } => {
                assert_eq!(store, "broken");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
