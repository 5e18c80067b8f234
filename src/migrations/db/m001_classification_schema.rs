//! Classification tables: journals, categories, areas and their links.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::graph::SqlExecutor;
use crate::migrations::Migration;

pub struct M001ClassificationSchema;

impl Migration for M001ClassificationSchema {
    type Context = dyn SqlExecutor + Sync;

    fn id(&self) -> &'static str {
        "db001_classification_schema"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Journal classification tables (categories, areas, quartiles)"
    }

    fn up<'a>(&'a self, ctx: &'a Self::Context) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            // One row per identifier a journal is known by (ISSN, eISSN, ...)
            ctx.execute_sql(
                r#"
                CREATE TABLE IF NOT EXISTS journals (
                    id TEXT PRIMARY KEY,
                    title TEXT
                );

                CREATE TABLE IF NOT EXISTS categories (
                    id TEXT PRIMARY KEY
                );

                CREATE TABLE IF NOT EXISTS areas (
                    id TEXT PRIMARY KEY
                );
                "#,
            )
            .await?;

            ctx.execute_sql(
                r#"
                CREATE TABLE IF NOT EXISTS journal_categories (
                    journal_id TEXT NOT NULL REFERENCES journals (id),
                    category_id TEXT NOT NULL REFERENCES categories (id),
                    quartile TEXT,
                    PRIMARY KEY (journal_id, category_id)
                );

                CREATE TABLE IF NOT EXISTS category_areas (
                    category_id TEXT NOT NULL REFERENCES categories (id),
                    area_id TEXT NOT NULL REFERENCES areas (id),
                    PRIMARY KEY (category_id, area_id)
                );

                CREATE INDEX IF NOT EXISTS journal_categories_category_idx
                ON journal_categories (category_id);

                CREATE INDEX IF NOT EXISTS journal_categories_quartile_idx
                ON journal_categories (quartile);

                CREATE INDEX IF NOT EXISTS category_areas_area_idx
                ON category_areas (area_id);
                "#,
            )
            .await?;

            Ok(())
        }
        .boxed()
    }
}
