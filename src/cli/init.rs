//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::graph::backends::postgres::PostgresClient;
use crate::migrations::run_migrations;

use super::App;

impl App {
    /// Create the AGE graph of every journal store and migrate every
    /// category store's schema.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;
        if config.journal_stores.is_empty() && config.category_stores.is_empty() {
            tracing::warn!("No stores configured, nothing to initialize");
            return Ok(());
        }

        for store in &config.journal_stores {
            tracing::info!(store = %store.name, graph = %store.graph, "Ensuring graph exists");
            let client = PostgresClient::connect(&store.uri, &store.graph)
                .await
                .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;
            client
                .ensure_graph_exists()
                .await
                .map_err(|e| color_eyre::eyre::eyre!("Failed to create graph: {}", e))?;
        }

        for store in &config.category_stores {
            tracing::info!(store = %store.name, "Running migrations");
            let client = PostgresClient::connect_sql(&store.uri)
                .await
                .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;
            let result = run_migrations(&client)
                .await
                .map_err(|e| color_eyre::eyre::eyre!("Migration failed: {}", e))?;

            if result.applied_migrations.is_empty() {
                tracing::info!(
                    store = %store.name,
                    "Schema already at v{}, no migrations needed",
                    result.current_version
                );
            } else {
                tracing::info!(
                    store = %store.name,
                    "Migrations complete: v{} -> v{}, applied: {:?}",
                    result.previous_version,
                    result.current_version,
                    result.applied_migrations
                );
            }
        }

        Ok(())
    }
}
