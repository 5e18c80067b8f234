//! In-memory stores over fixed record sets.
//!
//! Both stores answer with the same rows their database-backed
//! counterparts produce, which makes them stand-ins for tests and demos.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;
use crate::graph::Row;
use crate::repositories::{columns, journal_id_from_uri, CategoryStore, JournalStore};

/// One journal as held by a journal store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub uri: String,
    pub title: String,
    /// Print and online identifiers (ISSN, EISSN).
    #[serde(default)]
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub seal: bool,
    #[serde(default)]
    pub apc: bool,
}

impl JournalRecord {
    fn to_row(&self) -> Row {
        Row::from_pairs([
            (columns::URI, json!(self.uri)),
            (columns::TITLE, json!(self.title)),
            (columns::LANGUAGE, json!(self.languages)),
            (columns::PUBLISHER, json!(self.publisher)),
            (columns::LICENSE, json!(self.license)),
            (columns::SEAL, json!(self.seal)),
            (columns::APC, json!(self.apc)),
        ])
    }
}

/// Journal store holding a fixed list of journals.
pub struct InMemoryJournalStore {
    name: String,
    journals: Vec<JournalRecord>,
}

impl InMemoryJournalStore {
    pub fn new(name: impl Into<String>, journals: Vec<JournalRecord>) -> Self {
        Self {
            name: name.into(),
            journals,
        }
    }

    fn rows_where(&self, predicate: impl Fn(&JournalRecord) -> bool) -> Vec<Row> {
        self.journals
            .iter()
            .filter(|journal| predicate(journal))
            .map(JournalRecord::to_row)
            .collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl JournalStore for InMemoryJournalStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_by_id(&self, id: &str) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|j| {
            j.identifiers.iter().any(|identifier| identifier == id)
                || journal_id_from_uri(&j.uri) == id
        }))
    }

    async fn get_all(&self) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|_| true))
    }

    async fn get_with_title_containing(&self, text: &str) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|j| contains_ignore_case(&j.title, text)))
    }

    async fn get_published_by(&self, text: &str) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|j| {
            j.publisher
                .as_deref()
                .is_some_and(|publisher| contains_ignore_case(publisher, text))
        }))
    }

    async fn get_with_license_in(
        &self,
        licenses: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|j| {
            licenses.is_empty()
                || j.license
                    .as_ref()
                    .is_some_and(|license| licenses.contains(license))
        }))
    }

    async fn get_with_apc(&self) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|j| j.apc))
    }

    async fn get_with_doaj_seal(&self) -> Result<Vec<Row>, AppError> {
        Ok(self.rows_where(|j| j.seal))
    }

    async fn get_distinct_licenses(&self) -> Result<BTreeSet<String>, AppError> {
        Ok(self
            .journals
            .iter()
            .filter_map(|j| j.license.clone())
            .collect())
    }
}

/// A category of one journal, with the journal's quartile in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub id: String,
    #[serde(default)]
    pub quartile: Option<String>,
}

/// Classification of one journal: its categories and areas.
///
/// Every category listed is linked to every area listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategoryAssignment>,
    #[serde(default)]
    pub areas: Vec<String>,
}

impl ClassificationRecord {
    pub fn new(identifiers: &[&str]) -> Self {
        Self {
            identifiers: identifiers.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn category(mut self, id: &str, quartile: Option<&str>) -> Self {
        self.categories.push(CategoryAssignment {
            id: id.to_string(),
            quartile: quartile.map(str::to_string),
        });
        self
    }

    pub fn area(mut self, id: &str) -> Self {
        self.areas.push(id.to_string());
        self
    }
}

/// A (journal, category) pairing.
#[derive(Debug, Clone)]
struct Pairing {
    journal_id: String,
    category_id: String,
    quartile: Option<String>,
}

/// Category store built from classification records.
///
/// Records are normalized the way the relational tables are: one pairing
/// per (journal, category), first quartile wins.
pub struct InMemoryCategoryStore {
    name: String,
    categories: BTreeSet<String>,
    areas: BTreeSet<String>,
    pairings: Vec<Pairing>,
    category_areas: BTreeSet<(String, String)>,
}

impl InMemoryCategoryStore {
    pub fn new(name: impl Into<String>, records: Vec<ClassificationRecord>) -> Self {
        let mut store = Self {
            name: name.into(),
            categories: BTreeSet::new(),
            areas: BTreeSet::new(),
            pairings: Vec::new(),
            category_areas: BTreeSet::new(),
        };

        for record in records {
            for journal_id in &record.identifiers {
                for category in &record.categories {
                    store.categories.insert(category.id.clone());
                    let known = store
                        .pairings
                        .iter()
                        .any(|p| &p.journal_id == journal_id && p.category_id == category.id);
                    if !known {
                        store.pairings.push(Pairing {
                            journal_id: journal_id.clone(),
                            category_id: category.id.clone(),
                            quartile: category.quartile.clone(),
                        });
                    }
                }
                for area in &record.areas {
                    store.areas.insert(area.clone());
                    for category in &record.categories {
                        store
                            .category_areas
                            .insert((category.id.clone(), area.clone()));
                    }
                }
            }
        }

        store
    }

    fn quartiles_of(&self, category_id: &str) -> BTreeSet<Option<&str>> {
        let quartiles: BTreeSet<Option<&str>> = self
            .pairings
            .iter()
            .filter(|p| p.category_id == category_id)
            .map(|p| p.quartile.as_deref())
            .collect();
        if quartiles.is_empty() {
            // LEFT JOIN with no pairing
            [None].into()
        } else {
            quartiles
        }
    }

    fn areas_of(&self, category_id: &str) -> Vec<&str> {
        self.category_areas
            .iter()
            .filter(|(category, _)| category == category_id)
            .map(|(_, area)| area.as_str())
            .collect()
    }

    fn categories_in(&self, area_id: &str) -> Vec<&str> {
        self.category_areas
            .iter()
            .filter(|(_, area)| area == area_id)
            .map(|(category, _)| category.as_str())
            .collect()
    }

    fn category_rows<'a>(&'a self, ids: impl Iterator<Item = &'a str>) -> Vec<Row> {
        let mut seen = BTreeSet::new();
        for id in ids {
            for quartile in self.quartiles_of(id) {
                seen.insert((id, quartile));
            }
        }
        seen.into_iter()
            .map(|(id, quartile)| category_row(id, quartile))
            .collect()
    }

    fn journal_ids_where(&self, predicate: impl Fn(&Pairing) -> bool) -> BTreeSet<String> {
        self.pairings
            .iter()
            .filter(|p| predicate(p))
            .map(|p| p.journal_id.clone())
            .collect()
    }

    fn in_any_area(&self, category_id: &str, area_ids: &BTreeSet<String>) -> bool {
        self.areas_of(category_id)
            .into_iter()
            .any(|area| area_ids.is_empty() || area_ids.contains(area))
    }
}

/// Empty sets place no restriction.
fn admits(set: &BTreeSet<String>, value: Option<&str>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

fn category_row(id: &str, quartile: Option<&str>) -> Row {
    Row::from_pairs([
        (columns::CATEGORY_ID, json!(id)),
        (columns::QUARTILE, json!(quartile)),
    ])
}

fn area_row(id: &str) -> Row {
    Row::from_pairs([(columns::AREA_ID, json!(id))])
}

fn lookup_row(category_id: Option<&str>, quartile: Option<&str>, area_id: Option<&str>) -> Row {
    let text = |value: Option<&str>| value.map_or(JsonValue::Null, |v| json!(v));
    Row::from_pairs([
        (columns::CATEGORY_ID, text(category_id)),
        (columns::QUARTILE, text(quartile)),
        (columns::AREA_ID, text(area_id)),
    ])
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_by_id(&self, id: &str) -> Result<Vec<Row>, AppError> {
        let mut rows = Vec::new();

        if self.categories.contains(id) {
            let areas = self.areas_of(id);
            for quartile in self.quartiles_of(id) {
                if areas.is_empty() {
                    rows.push(lookup_row(Some(id), quartile, None));
                }
                for &area in &areas {
                    rows.push(lookup_row(Some(id), quartile, Some(area)));
                }
            }
        } else if self.areas.contains(id) {
            let categories = self.categories_in(id);
            if categories.is_empty() {
                rows.push(lookup_row(None, None, Some(id)));
            }
            for category in categories {
                for quartile in self.quartiles_of(category) {
                    rows.push(lookup_row(Some(category), quartile, Some(id)));
                }
            }
        }

        Ok(rows)
    }

    async fn get_all_categories(&self) -> Result<Vec<Row>, AppError> {
        Ok(self.category_rows(self.categories.iter().map(String::as_str)))
    }

    async fn get_all_areas(&self) -> Result<Vec<Row>, AppError> {
        Ok(self.areas.iter().map(|id| area_row(id)).collect())
    }

    async fn get_categories_with_quartile_in(
        &self,
        quartiles: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        let rows = self.category_rows(self.categories.iter().map(String::as_str));
        Ok(rows
            .into_iter()
            .filter(|row| admits(quartiles, row.text(columns::QUARTILE)))
            .collect())
    }

    async fn get_categories_in_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        let ids = self
            .category_areas
            .iter()
            .filter(|(_, area)| admits(area_ids, Some(area)))
            .map(|(category, _)| category.as_str());
        Ok(self.category_rows(ids))
    }

    async fn get_areas_for_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError> {
        let areas: BTreeSet<&str> = self
            .category_areas
            .iter()
            .filter(|(category, _)| admits(category_ids, Some(category)))
            .map(|(_, area)| area.as_str())
            .collect();
        Ok(areas.into_iter().map(area_row).collect())
    }

    async fn categories_for_journal(&self, journal_id: &str) -> Result<Vec<Row>, AppError> {
        let pairs: BTreeSet<(&str, Option<&str>)> = self
            .pairings
            .iter()
            .filter(|p| p.journal_id == journal_id)
            .map(|p| (p.category_id.as_str(), p.quartile.as_deref()))
            .collect();
        Ok(pairs
            .into_iter()
            .map(|(id, quartile)| category_row(id, quartile))
            .collect())
    }

    async fn areas_for_journal(&self, journal_id: &str) -> Result<Vec<Row>, AppError> {
        let areas: BTreeSet<&str> = self
            .pairings
            .iter()
            .filter(|p| p.journal_id == journal_id)
            .flat_map(|p| self.areas_of(&p.category_id))
            .collect();
        Ok(areas.into_iter().map(area_row).collect())
    }

    async fn distinct_category_ids(&self) -> Result<BTreeSet<String>, AppError> {
        Ok(self.categories.clone())
    }

    async fn distinct_quartiles(&self) -> Result<BTreeSet<String>, AppError> {
        Ok(self
            .pairings
            .iter()
            .filter_map(|p| p.quartile.clone())
            .collect())
    }

    async fn journal_ids_matching(
        &self,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError> {
        Ok(self.journal_ids_where(|p| {
            admits(category_ids, Some(&p.category_id)) && admits(quartiles, p.quartile.as_deref())
        }))
    }

    async fn journal_ids_in_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError> {
        Ok(self.journal_ids_where(|p| self.in_any_area(&p.category_id, area_ids)))
    }

    async fn journal_ids_in_areas_matching(
        &self,
        area_ids: &BTreeSet<String>,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError> {
        Ok(self.journal_ids_where(|p| {
            self.in_any_area(&p.category_id, area_ids)
                && admits(category_ids, Some(&p.category_id))
                && admits(quartiles, p.quartile.as_deref())
        }))
    }
}
