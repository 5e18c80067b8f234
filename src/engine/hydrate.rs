//! Row-to-entity conversion.
//!
//! Everything here is pure; fetching nested categories and areas is done
//! by the engine.

use serde_json::Value as JsonValue;

use crate::graph::Row;
use crate::models::{Area, Category, Journal};
use crate::repositories::{columns, journal_id_from_uri};

/// Splits a store's journal rows into one group per journal.
///
/// Consecutive rows with the same URI belong to the same journal. Rows
/// without a URI are dropped.
pub(crate) fn group_journal_rows(rows: Vec<Row>) -> Vec<Vec<Row>> {
    let mut groups: Vec<Vec<Row>> = Vec::new();
    for row in rows {
        let Some(uri) = row.text(columns::URI) else {
            tracing::debug!("Skipping journal row without uri");
            continue;
        };
        match groups.last_mut() {
            Some(group) if group[0].text(columns::URI) == Some(uri) => group.push(row),
            _ => groups.push(vec![row]),
        }
    }
    groups
}

/// Journal id of a row group: the final segment of its URI.
pub(crate) fn group_journal_id(group: &[Row]) -> Option<String> {
    group
        .first()
        .and_then(|row| row.text(columns::URI))
        .map(|uri| journal_id_from_uri(uri).to_string())
}

/// Builds a journal without classification from its row group.
///
/// Scalar fields come from the first row; languages are collected from
/// every row, in order, without repeats.
pub(crate) fn journal_from_rows(id: &str, group: &[Row]) -> Journal {
    let Some(first) = group.first() else {
        return Journal::new(id, "");
    };

    let mut languages: Vec<String> = Vec::new();
    for row in group {
        for language in languages_of(row.get_raw(columns::LANGUAGE)) {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
    }

    Journal::new(id, first.text(columns::TITLE).unwrap_or_default())
        .with_languages(languages)
        .with_publisher(first.text(columns::PUBLISHER).map(str::to_string))
        .with_licence(first.text(columns::LICENSE).map(str::to_string))
        .with_seal(flag(first.get_raw(columns::SEAL)))
        .with_apc(flag(first.get_raw(columns::APC)))
}

/// Reads a boolean that may arrive as a JSON bool or as "true"/"false" text.
pub(crate) fn flag(value: Option<&JsonValue>) -> bool {
    match value {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn languages_of(value: Option<&JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn category_from_row(row: &Row) -> Option<Category> {
    row.text(columns::CATEGORY_ID)
        .map(|id| Category::new(id, row.text(columns::QUARTILE).map(str::to_string)))
}

pub(crate) fn area_from_row(row: &Row) -> Option<Area> {
    row.text(columns::AREA_ID).map(Area::new)
}

/// Interprets a category store's lookup rows as a category hit for `id`.
///
/// Requires the first row's `category_id` to be `id`. The quartile is the
/// first non-null one among the rows for that category.
pub(crate) fn category_from_lookup(id: &str, rows: &[Row]) -> Option<Category> {
    let first = rows.first()?;
    if first.text(columns::CATEGORY_ID) != Some(id) {
        return None;
    }
    let quartile = rows
        .iter()
        .filter(|row| row.text(columns::CATEGORY_ID) == Some(id))
        .find_map(|row| row.text(columns::QUARTILE))
        .map(str::to_string);
    Some(Category::new(id, quartile))
}

/// Interprets a category store's lookup rows as an area hit for `id`.
pub(crate) fn area_from_lookup(id: &str, rows: &[Row]) -> Option<Area> {
    let first = rows.first()?;
    (first.text(columns::AREA_ID) == Some(id)).then(|| Area::new(id))
}
