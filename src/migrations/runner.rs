//! Migration runner with version tracking.

use crate::error::AppError;
use crate::graph::{GraphClient, SqlExecutor, SqlQueryExt, Transaction};
use crate::migrations::db;

/// Result of running migrations.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub previous_version: u32,
    pub current_version: u32,
    pub applied_migrations: Vec<String>,
}

/// Brings a category store's schema up to date.
pub async fn run_migrations<C>(client: &C) -> Result<MigrationResult, AppError>
where
    C: GraphClient + 'static,
    for<'a> C::Tx<'a>: SqlExecutor + 'static,
{
    ensure_db_schema_version_table(client).await?;

    let previous_version = get_db_schema_version(client).await?;
    let register = db::create_register();

    let applied = register
        .run_pending(client, previous_version, |version, id| {
            update_db_schema_version(client, version, id)
        })
        .await?;

    let current_version = get_db_schema_version(client).await?;
    tracing::info!(
        previous_version,
        current_version,
        applied = applied.len(),
        "Schema up to date"
    );

    Ok(MigrationResult {
        previous_version,
        current_version,
        applied_migrations: applied,
    })
}

const CREATE_DB_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS db_schema_version (
    id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    applied_migrations TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);
INSERT INTO db_schema_version (id, version) VALUES (1, 0) ON CONFLICT (id) DO NOTHING;
"#;

const UPDATE_DB_SCHEMA_VERSION: &str = "UPDATE db_schema_version \
     SET version = $1::bigint::integer, \
         applied_migrations = array_append(applied_migrations, $2::text), \
         last_applied_at = NOW() \
     WHERE id = 1";

async fn ensure_db_schema_version_table<C>(client: &C) -> Result<(), AppError>
where
    C: GraphClient,
{
    let txn = client.begin().await?;
    txn.execute_sql(CREATE_DB_SCHEMA_VERSION_TABLE).await?;
    txn.commit().await?;
    Ok(())
}

async fn get_db_schema_version<C>(client: &C) -> Result<u32, AppError>
where
    C: GraphClient,
{
    let txn = client.begin().await?;
    let rows = txn
        .sql("SELECT version FROM db_schema_version WHERE id = 1")
        .fetch_all()
        .await?;
    txn.commit().await?;

    Ok(rows
        .first()
        .and_then(|r| r.get::<i64>("version").ok())
        .unwrap_or(0) as u32)
}

async fn update_db_schema_version<C>(
    client: &C,
    version: u32,
    migration_id: &str,
) -> Result<(), AppError>
where
    C: GraphClient,
{
    let txn = client.begin().await?;
    txn.sql(UPDATE_DB_SCHEMA_VERSION)
        .bind(version)
        .bind(migration_id)
        .fetch_all()
        .await?;
    txn.commit().await?;
    Ok(())
}
