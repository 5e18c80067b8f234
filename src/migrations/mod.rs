//! Schema migrations for SQL category stores.
//!
//! Migrations are idempotent (`IF NOT EXISTS` everywhere) and forward-only.
//! The applied version is tracked in the `db_schema_version` table; each
//! migration runs in its own transaction.
//!
//! Journal stores need no migration: their graph only has to exist, see
//! [`PostgresClient::ensure_graph_exists`](crate::graph::backends::postgres::PostgresClient::ensure_graph_exists).

pub mod db;
mod runner;
mod traits;

pub use runner::{run_migrations, MigrationResult};
pub use traits::{DbMigration, Migration, Register};
