//! Identifier resolution and journal hydration.

use std::collections::BTreeSet;

use futures::future::BoxFuture;

use super::hydrate::{
    area_from_lookup, area_from_row, category_from_lookup, category_from_row, group_journal_id,
    group_journal_rows, journal_from_rows,
};
use super::QueryEngine;
use crate::error::AppError;
use crate::graph::Row;
use crate::models::{Area, Category, Entity, Journal};
use crate::repositories::JournalStore;

/// One call against a journal store, producing journal rows.
pub(super) type JournalCall<'a> =
    dyn Fn(&'a dyn JournalStore) -> BoxFuture<'a, Result<Vec<Row>, AppError>> + Send + Sync + 'a;

impl QueryEngine {
    /// Resolves an identifier of unknown kind.
    ///
    /// Stores are asked in order and the first hit wins: every journal
    /// store, then every category store as a category, then every category
    /// store as an area. Unknown identifiers resolve to `None`.
    pub async fn get_entity_by_id(&self, id: &str) -> Result<Option<Entity>, AppError> {
        for store in &self.journal_stores {
            let rows = self.settle(store.name(), "get_by_id", store.get_by_id(id).await)?;
            if let Some(group) = group_journal_rows(rows).into_iter().next() {
                tracing::debug!(id, store = store.name(), "Resolved as journal");
                let journal = self.classify(journal_from_rows(id, &group)).await?;
                return Ok(Some(Entity::Journal(journal)));
            }
        }

        for store in &self.category_stores {
            let rows = self.settle(store.name(), "get_by_id", store.get_by_id(id).await)?;
            if let Some(category) = category_from_lookup(id, &rows) {
                tracing::debug!(id, store = store.name(), "Resolved as category");
                return Ok(Some(Entity::Category(category)));
            }
        }

        for store in &self.category_stores {
            let rows = self.settle(store.name(), "get_by_id", store.get_by_id(id).await)?;
            if let Some(area) = area_from_lookup(id, &rows) {
                tracing::debug!(id, store = store.name(), "Resolved as area");
                return Ok(Some(Entity::Area(area)));
            }
        }

        Ok(None)
    }

    /// Categories of a journal across every category store.
    pub(super) async fn categories_for_journal(
        &self,
        journal_id: &str,
    ) -> Result<Vec<Category>, AppError> {
        let mut categories = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(
                store.name(),
                "categories_for_journal",
                store.categories_for_journal(journal_id).await,
            )?;
            categories.extend(rows.iter().filter_map(category_from_row));
        }
        Ok(categories)
    }

    /// Areas of a journal across every category store.
    pub(super) async fn areas_for_journal(&self, journal_id: &str) -> Result<Vec<Area>, AppError> {
        let mut areas = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(
                store.name(),
                "areas_for_journal",
                store.areas_for_journal(journal_id).await,
            )?;
            areas.extend(rows.iter().filter_map(area_from_row));
        }
        Ok(areas)
    }

    /// Attaches categories and areas to a journal built from rows.
    async fn classify(&self, journal: Journal) -> Result<Journal, AppError> {
        let categories = self.categories_for_journal(journal.id()).await?;
        let areas = self.areas_for_journal(journal.id()).await?;
        Ok(journal.with_categories(categories).with_areas(areas))
    }

    /// Runs one call against every journal store and hydrates the rows.
    ///
    /// `keep` filters journal ids before any classification round-trip.
    pub(super) async fn journals_from<'a>(
        &'a self,
        operation: &'static str,
        call: &JournalCall<'a>,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Vec<Journal>, AppError> {
        let mut journals = Vec::new();
        for store in &self.journal_stores {
            let rows = self.settle(store.name(), operation, call(store.as_ref()).await)?;
            tracing::debug!(
                store = store.name(),
                operation,
                rows = rows.len(),
                "Fetched journal rows"
            );
            for group in group_journal_rows(rows) {
                let Some(id) = group_journal_id(&group) else {
                    continue;
                };
                if keep(&id) {
                    journals.push(self.classify(journal_from_rows(&id, &group)).await?);
                }
            }
        }
        Ok(journals)
    }

    /// Resolves each id and keeps the ones that turn out to be journals.
    pub(super) async fn resolve_journals(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<Vec<Journal>, AppError> {
        let mut journals = Vec::new();
        for id in ids {
            if let Some(journal) = self
                .get_entity_by_id(id)
                .await?
                .and_then(Entity::into_journal)
            {
                journals.push(journal);
            }
        }
        Ok(journals)
    }
}
