//! Single-kind queries: journals from the journal stores, categories and
//! areas from the category stores.

use std::collections::BTreeSet;

use super::hydrate::{area_from_row, category_from_row};
use super::QueryEngine;
use crate::error::AppError;
use crate::models::{Area, Category, Journal};

impl QueryEngine {
    pub async fn get_all_journals(&self) -> Result<Vec<Journal>, AppError> {
        self.journals_from("get_all", &|store| store.get_all(), |_| true)
            .await
    }

    /// Journals whose title contains `text`, ignoring case.
    pub async fn get_journals_with_title(&self, text: &str) -> Result<Vec<Journal>, AppError> {
        self.journals_from(
            "get_with_title_containing",
            &|store| store.get_with_title_containing(text),
            |_| true,
        )
        .await
    }

    /// Journals whose publisher contains `text`, ignoring case.
    pub async fn get_journals_published_by(&self, text: &str) -> Result<Vec<Journal>, AppError> {
        self.journals_from(
            "get_published_by",
            &|store| store.get_published_by(text),
            |_| true,
        )
        .await
    }

    /// Journals licensed under one of `licenses`; an empty set admits any.
    pub async fn get_journals_with_license(
        &self,
        licenses: &BTreeSet<String>,
    ) -> Result<Vec<Journal>, AppError> {
        self.journals_from(
            "get_with_license_in",
            &|store| store.get_with_license_in(licenses),
            |_| true,
        )
        .await
    }

    /// Journals charging an article-processing charge.
    pub async fn get_journals_with_apc(&self) -> Result<Vec<Journal>, AppError> {
        self.journals_from("get_with_apc", &|store| store.get_with_apc(), |_| true)
            .await
    }

    pub async fn get_journals_with_doaj_seal(&self) -> Result<Vec<Journal>, AppError> {
        self.journals_from(
            "get_with_doaj_seal",
            &|store| store.get_with_doaj_seal(),
            |_| true,
        )
        .await
    }

    /// Every category, once per quartile it carries in some store.
    pub async fn get_all_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(
                store.name(),
                "get_all_categories",
                store.get_all_categories().await,
            )?;
            categories.extend(rows.iter().filter_map(category_from_row));
        }
        Ok(categories)
    }

    pub async fn get_all_areas(&self) -> Result<Vec<Area>, AppError> {
        let mut areas = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(store.name(), "get_all_areas", store.get_all_areas().await)?;
            areas.extend(rows.iter().filter_map(area_from_row));
        }
        Ok(areas)
    }

    /// Categories paired with one of `quartiles`; an empty set admits any.
    pub async fn get_categories_with_quartile(
        &self,
        quartiles: &BTreeSet<String>,
    ) -> Result<Vec<Category>, AppError> {
        let mut categories = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(
                store.name(),
                "get_categories_with_quartile_in",
                store.get_categories_with_quartile_in(quartiles).await,
            )?;
            categories.extend(rows.iter().filter_map(category_from_row));
        }
        Ok(categories)
    }

    /// Categories belonging to one of `area_ids`; an empty set admits any.
    pub async fn get_categories_assigned_to_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<Vec<Category>, AppError> {
        let mut categories = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(
                store.name(),
                "get_categories_in_areas",
                store.get_categories_in_areas(area_ids).await,
            )?;
            categories.extend(rows.iter().filter_map(category_from_row));
        }
        Ok(categories)
    }

    /// Areas containing one of `category_ids`; an empty set admits any.
    pub async fn get_areas_assigned_to_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Area>, AppError> {
        let mut areas = Vec::new();
        for store in &self.category_stores {
            let rows = self.settle(
                store.name(),
                "get_areas_for_categories",
                store.get_areas_for_categories(category_ids).await,
            )?;
            areas.extend(rows.iter().filter_map(area_from_row));
        }
        Ok(areas)
    }
}
