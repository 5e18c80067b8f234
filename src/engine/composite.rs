//! Queries combining journal and category stores.
//!
//! Every filter dimension left empty by the caller is widened to all values
//! the stores currently know for it. A dimension that is still empty after
//! widening cannot match anything, so the query ends there.

use std::collections::BTreeSet;

use super::QueryEngine;
use crate::error::AppError;
use crate::models::Journal;

/// The caller's set, or the defaults when the caller gave none.
async fn or_defaults<F>(
    given: &BTreeSet<String>,
    defaults: F,
) -> Result<BTreeSet<String>, AppError>
where
    F: std::future::Future<Output = Result<BTreeSet<String>, AppError>>,
{
    if given.is_empty() {
        defaults.await
    } else {
        Ok(given.clone())
    }
}

impl QueryEngine {
    /// Journals with a category in `category_ids` at a quartile in `quartiles`.
    pub async fn get_journals_in_categories_with_quartile(
        &self,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<Vec<Journal>, AppError> {
        let category_ids = or_defaults(category_ids, self.known_category_ids()).await?;
        let quartiles = or_defaults(quartiles, self.known_quartiles()).await?;
        if category_ids.is_empty() || quartiles.is_empty() {
            return Ok(Vec::new());
        }

        let mut journal_ids = BTreeSet::new();
        for store in &self.category_stores {
            journal_ids.extend(self.settle(
                store.name(),
                "journal_ids_matching",
                store.journal_ids_matching(&category_ids, &quartiles).await,
            )?);
        }

        self.resolve_journals(&journal_ids).await
    }

    /// Journals classified in one of `area_ids` and licensed under one of `licenses`.
    ///
    /// The license filter runs in the journal stores; every hit must also be
    /// classified in one of the areas.
    pub async fn get_journals_in_areas_with_license(
        &self,
        area_ids: &BTreeSet<String>,
        licenses: &BTreeSet<String>,
    ) -> Result<Vec<Journal>, AppError> {
        let area_ids = or_defaults(area_ids, self.known_area_ids()).await?;
        let licenses = or_defaults(licenses, self.known_licenses()).await?;
        if area_ids.is_empty() || licenses.is_empty() {
            return Ok(Vec::new());
        }

        let mut in_areas = BTreeSet::new();
        for store in &self.category_stores {
            in_areas.extend(self.settle(
                store.name(),
                "journal_ids_in_areas",
                store.journal_ids_in_areas(&area_ids).await,
            )?);
        }
        if in_areas.is_empty() {
            return Ok(Vec::new());
        }

        self.journals_from(
            "get_with_license_in",
            &|store| store.get_with_license_in(&licenses),
            |id| in_areas.contains(id),
        )
        .await
    }

    /// Journals without an article-processing charge, classified in one of
    /// `area_ids` through a category in `category_ids` at a quartile in
    /// `quartiles`.
    pub async fn get_diamond_journals_in_areas_and_categories_with_quartile(
        &self,
        area_ids: &BTreeSet<String>,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<Vec<Journal>, AppError> {
        let area_ids = or_defaults(area_ids, self.known_area_ids()).await?;
        let category_ids = or_defaults(category_ids, self.known_category_ids()).await?;
        let quartiles = or_defaults(quartiles, self.known_quartiles()).await?;
        if area_ids.is_empty() || category_ids.is_empty() || quartiles.is_empty() {
            return Ok(Vec::new());
        }

        let mut journal_ids = BTreeSet::new();
        for store in &self.category_stores {
            journal_ids.extend(self.settle(
                store.name(),
                "journal_ids_in_areas_matching",
                store
                    .journal_ids_in_areas_matching(&area_ids, &category_ids, &quartiles)
                    .await,
            )?);
        }

        let journals = self.resolve_journals(&journal_ids).await?;
        Ok(journals
            .into_iter()
            .filter(|journal| {
                if journal.apc() {
                    tracing::debug!(id = journal.id(), "Dropping journal with APC");
                }
                !journal.apc()
            })
            .collect())
    }

    async fn known_area_ids(&self) -> Result<BTreeSet<String>, AppError> {
        let areas = self.get_all_areas().await?;
        Ok(areas.iter().map(|area| area.id().to_string()).collect())
    }

    async fn known_category_ids(&self) -> Result<BTreeSet<String>, AppError> {
        let mut ids = BTreeSet::new();
        for store in &self.category_stores {
            ids.extend(self.settle(
                store.name(),
                "distinct_category_ids",
                store.distinct_category_ids().await,
            )?);
        }
        Ok(ids)
    }

    async fn known_quartiles(&self) -> Result<BTreeSet<String>, AppError> {
        let mut quartiles = BTreeSet::new();
        for store in &self.category_stores {
            quartiles.extend(self.settle(
                store.name(),
                "distinct_quartiles",
                store.distinct_quartiles().await,
            )?);
        }
        Ok(quartiles)
    }

    async fn known_licenses(&self) -> Result<BTreeSet<String>, AppError> {
        let mut licenses = BTreeSet::new();
        for store in &self.journal_stores {
            licenses.extend(self.settle(
                store.name(),
                "get_distinct_licenses",
                store.get_distinct_licenses().await,
            )?);
        }
        Ok(licenses)
    }
}
