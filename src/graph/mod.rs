//! Backend-agnostic database access for the store adapters.
//!
//! The traits split along the two query languages the stores speak:
//!
//! - [`CypherExecutor`] - Cypher against a property graph (journal stores)
//! - [`SqlExecutor`] - parametrized SQL (category stores, migrations)
//! - [`Transaction`] - Transaction lifecycle (commit/rollback)
//! - [`GraphClient`] - Connection management and transaction creation
//!
//! Results come back as flat [`Row`]s either way.
//!
//! ```ignore
//! use bibliofed::graph::{QueryExt, SqlQueryExt};
//!
//! let journals = client
//!     .query("MATCH (j:Journal) WHERE j.seal = $seal RETURN j.uri AS journal")
//!     .param("seal", true)
//!     .fetch_all()
//!     .await?;
//!
//! let areas = client
//!     .sql("SELECT area_id FROM category_areas WHERE category_id = ANY($1)")
//!     .bind(vec!["COMP"])
//!     .fetch_all()
//!     .await?;
//! ```

mod cypher;
mod macros;
mod query;
mod row;
mod traits;

pub mod backends;

pub use cypher::{extract_return_columns, ParseError};
pub use query::{Query, QueryExt, SqlQuery, SqlQueryExt};
pub use row::{Params, Row, RowStream, SqlParams};
pub use traits::{CypherExecutor, GraphClient, SqlExecutor, Transaction};

// Macro is defined at the crate root via #[macro_export]
#[doc(inline)]
pub use crate::cypher;
