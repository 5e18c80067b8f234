//! Bibliofed - federated queries over scholarly journal stores.
//!
//! Journal metadata lives in one or more journal stores, subject
//! classification (categories, areas, quartiles) in one or more category
//! stores. The [`engine::QueryEngine`] asks every registered store and
//! assembles [`models::Journal`], [`models::Category`] and
//! [`models::Area`] values from what they return.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod migrations;
pub mod models;
pub mod repositories;
