//! Database backends.
//!
//! A backend provides a client implementing [`GraphClient`](crate::graph::GraphClient)
//! and a transaction type implementing [`Transaction`](crate::graph::Transaction),
//! both also implementing [`CypherExecutor`](crate::graph::CypherExecutor) and
//! [`SqlExecutor`](crate::graph::SqlExecutor).
//!
//! | Backend | Module |
//! |---------|--------|
//! | PostgreSQL + Apache AGE | [`postgres`] |

pub mod postgres;
