//! Store contracts and their adapters.
//!
//! Both contracts are read-only and return flat [`Row`]s; turning rows into
//! domain objects is the engine's job. Set-valued filters treat an empty set
//! as "no restriction on this dimension".
//!
//! Adapters:
//! - [`GraphJournalStore`] - journals as `:Journal` vertices, queried with Cypher
//! - [`SqlCategoryStore`] - classification tables, queried with SQL
//! - [`InMemoryJournalStore`] / [`InMemoryCategoryStore`] - fixed record sets

mod category;
mod journal;
mod memory;

pub use category::SqlCategoryStore;
pub use journal::GraphJournalStore;
pub use memory::{
    CategoryAssignment, ClassificationRecord, InMemoryCategoryStore, InMemoryJournalStore,
    JournalRecord,
};

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::Row;

/// Column names shared by the adapters and the engine.
pub mod columns {
    /// Journal URI; its final path segment is the journal id.
    pub const URI: &str = "uri";
    pub const TITLE: &str = "title";
    /// A single language string or a list of them.
    pub const LANGUAGE: &str = "language";
    pub const PUBLISHER: &str = "publisher";
    pub const LICENSE: &str = "license";
    /// Boolean, or the string "true"/"false".
    pub const SEAL: &str = "seal";
    /// Boolean, or the string "true"/"false".
    pub const APC: &str = "apc";

    pub const CATEGORY_ID: &str = "category_id";
    pub const QUARTILE: &str = "quartile";
    pub const AREA_ID: &str = "area_id";
    pub const JOURNAL_ID: &str = "journal_id";
}

/// Read-only query surface over journal metadata.
///
/// Every method except [`get_distinct_licenses`](JournalStore::get_distinct_licenses)
/// returns journal rows with the columns in [`columns`]: `uri` and `title`
/// always, the rest when known. A journal may span several consecutive rows
/// when the store reports one row per language.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Journals carrying `id` as one of their identifiers.
    async fn get_by_id(&self, id: &str) -> Result<Vec<Row>, AppError>;

    async fn get_all(&self) -> Result<Vec<Row>, AppError>;

    /// Case-insensitive substring match on the title.
    async fn get_with_title_containing(&self, text: &str) -> Result<Vec<Row>, AppError>;

    /// Case-insensitive substring match on the publisher.
    async fn get_published_by(&self, text: &str) -> Result<Vec<Row>, AppError>;

    /// Journals whose license is exactly one of `licenses`.
    async fn get_with_license_in(&self, licenses: &BTreeSet<String>)
        -> Result<Vec<Row>, AppError>;

    async fn get_with_apc(&self) -> Result<Vec<Row>, AppError>;

    async fn get_with_doaj_seal(&self) -> Result<Vec<Row>, AppError>;

    /// Every license value held by at least one journal.
    async fn get_distinct_licenses(&self) -> Result<BTreeSet<String>, AppError>;
}

/// Read-only query surface over category, area and quartile relationships.
///
/// Category rows carry `category_id` and `quartile` (possibly null), area
/// rows carry `area_id`.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Looks `id` up as a category, falling back to an area.
    ///
    /// Rows carry `category_id`, `quartile` and `area_id`. A category hit
    /// yields rows whose `category_id` is `id`; an area hit yields rows
    /// whose `area_id` is `id`.
    async fn get_by_id(&self, id: &str) -> Result<Vec<Row>, AppError>;

    /// Every category, once per distinct quartile it is paired with.
    async fn get_all_categories(&self) -> Result<Vec<Row>, AppError>;

    async fn get_all_areas(&self) -> Result<Vec<Row>, AppError>;

    async fn get_categories_with_quartile_in(
        &self,
        quartiles: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError>;

    async fn get_categories_in_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError>;

    async fn get_areas_for_categories(
        &self,
        category_ids: &BTreeSet<String>,
    ) -> Result<Vec<Row>, AppError>;

    /// Categories of one journal, with that journal's quartile in each.
    async fn categories_for_journal(&self, journal_id: &str) -> Result<Vec<Row>, AppError>;

    /// Areas reachable from one journal's categories.
    async fn areas_for_journal(&self, journal_id: &str) -> Result<Vec<Row>, AppError>;

    async fn distinct_category_ids(&self) -> Result<BTreeSet<String>, AppError>;

    /// Every non-null quartile value.
    async fn distinct_quartiles(&self) -> Result<BTreeSet<String>, AppError>;

    /// Journals with a (category, quartile) pairing inside both sets.
    async fn journal_ids_matching(
        &self,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError>;

    /// Journals classified in a category belonging to one of the areas.
    async fn journal_ids_in_areas(
        &self,
        area_ids: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError>;

    /// Journals with a (category, quartile) pairing inside both sets whose
    /// category also belongs to one of the areas.
    async fn journal_ids_in_areas_matching(
        &self,
        area_ids: &BTreeSet<String>,
        category_ids: &BTreeSet<String>,
        quartiles: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AppError>;
}

/// Journal id for a URI: its final path segment, ignoring a trailing `/`.
pub fn journal_id_from_uri(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri)
}

/// Collects one text column from rows into a set, skipping nulls.
pub(crate) fn text_set(rows: &[Row], column: &str) -> BTreeSet<String> {
    rows.iter()
        .filter_map(|row| row.text(column))
        .map(str::to_string)
        .collect()
}
