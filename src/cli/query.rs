//! Query command handlers.

use std::collections::BTreeSet;

use serde_json::Value as JsonValue;

use crate::engine::QueryEngine;
use crate::error::AppError;
use crate::models::Journal;

use super::{Command, JournalFilter};

fn set(values: Vec<String>) -> BTreeSet<String> {
    values.into_iter().collect()
}

/// Runs a query subcommand and returns its result as JSON.
pub(super) async fn run(command: Command, engine: &QueryEngine) -> Result<JsonValue, AppError> {
    let value = match command {
        Command::Init => {
            return Err(AppError::Validation(
                "init is not a query command".to_string(),
            ));
        }
        Command::Get { id } => serde_json::to_value(engine.get_entity_by_id(&id).await?),
        Command::Journals(filter) => serde_json::to_value(journals(filter, engine).await?),
        Command::Categories { quartile, area } => {
            let categories = if !quartile.is_empty() {
                engine.get_categories_with_quartile(&set(quartile)).await?
            } else if !area.is_empty() {
                engine.get_categories_assigned_to_areas(&set(area)).await?
            } else {
                engine.get_all_categories().await?
            };
            serde_json::to_value(categories)
        }
        Command::Areas { category } => {
            let areas = if category.is_empty() {
                engine.get_all_areas().await?
            } else {
                engine.get_areas_assigned_to_categories(&set(category)).await?
            };
            serde_json::to_value(areas)
        }
        Command::InCategories { category, quartile } => serde_json::to_value(
            engine
                .get_journals_in_categories_with_quartile(&set(category), &set(quartile))
                .await?,
        ),
        Command::InAreas { area, license } => serde_json::to_value(
            engine
                .get_journals_in_areas_with_license(&set(area), &set(license))
                .await?,
        ),
        Command::Diamond {
            area,
            category,
            quartile,
        } => serde_json::to_value(
            engine
                .get_diamond_journals_in_areas_and_categories_with_quartile(
                    &set(area),
                    &set(category),
                    &set(quartile),
                )
                .await?,
        ),
    };

    value.map_err(|e| AppError::Internal(format!("Failed to serialize result: {}", e)))
}

async fn journals(
    filter: JournalFilter,
    engine: &QueryEngine,
) -> Result<Vec<Journal>, AppError> {
    if let Some(title) = filter.title {
        engine.get_journals_with_title(&title).await
    } else if let Some(publisher) = filter.publisher {
        engine.get_journals_published_by(&publisher).await
    } else if !filter.license.is_empty() {
        engine.get_journals_with_license(&set(filter.license)).await
    } else if filter.apc {
        engine.get_journals_with_apc().await
    } else if filter.seal {
        engine.get_journals_with_doaj_seal().await
    } else {
        engine.get_all_journals().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::Parser;
    use serde_json::json;

    use super::*;
    use crate::cli::App;
    use crate::repositories::{
        ClassificationRecord, InMemoryCategoryStore, InMemoryJournalStore, JournalRecord,
    };

    fn engine() -> QueryEngine {
        let mut engine = QueryEngine::new();
        engine.add_journal_store(Arc::new(InMemoryJournalStore::new(
            "doaj",
            vec![JournalRecord {
                uri: "https://doaj.org/toc/1234-5678".to_string(),
                title: "Computing Letters".to_string(),
                identifiers: vec!["1234-5678".to_string()],
                license: Some("CC BY".to_string()),
                seal: true,
                ..JournalRecord::default()
            }],
        )));
        engine.add_category_store(Arc::new(InMemoryCategoryStore::new(
            "scimago",
            vec![ClassificationRecord::new(&["1234-5678"])
                .category("COMP", Some("Q1"))
                .area("1700")],
        )));
        engine
    }

    async fn run_args(args: &[&str]) -> JsonValue {
        let app = App::parse_from(std::iter::once("bibliofed").chain(args.iter().copied()));
        run(app.command, &engine()).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_prints_tagged_entity() {
        let value = run_args(&["get", "COMP"]).await;
        assert_eq!(value["kind"], json!("category"));
        assert_eq!(value["quartile"], json!("Q1"));

        assert_eq!(run_args(&["get", "0000-0000"]).await, JsonValue::Null);
    }

    #[tokio::test]
    async fn test_journal_filters() {
        assert_eq!(run_args(&["journals", "--seal"]).await.as_array().unwrap().len(), 1);
        assert!(run_args(&["journals", "--apc"]).await.as_array().unwrap().is_empty());
        assert!(run_args(&["journals", "--title", "biology"])
            .await
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_diamond_command() {
        let value = run_args(&["diamond", "--area", "1700"]).await;
        assert_eq!(value[0]["id"], json!("1234-5678"));
    }

    #[tokio::test]
    async fn test_init_is_rejected() {
        let err = run(Command::Init, &engine()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
