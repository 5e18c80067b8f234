//! CLI module for Bibliofed.
//!
//! Subcommands:
//! - `init`: Create graphs and relational schema for every configured store
//! - `get`: Resolve an identifier of unknown kind
//! - `journals`, `categories`, `areas`: Single-kind queries
//! - `in-categories`, `in-areas`, `diamond`: Queries across both store kinds
//!
//! Query results are written to stdout as pretty-printed JSON; logs go to
//! stderr.

mod init;
mod query;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::engine::QueryEngine;
use crate::error::AppError;
use crate::graph::backends::postgres::PostgresClient;
use crate::repositories::{GraphJournalStore, SqlCategoryStore};

/// Bibliofed - federated scholarly journal queries
#[derive(Parser)]
#[command(name = "bibliofed")]
#[command(about = "Query journals, subject categories and areas across federated stores")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create AGE graphs and run migrations for every configured store
    Init,

    /// Resolve an identifier to a journal, category or area
    Get {
        /// Journal identifier (ISSN, eISSN, ...), category id or area id
        id: String,
    },

    /// List journals, optionally filtered
    Journals(JournalFilter),

    /// List subject categories
    Categories {
        /// Only categories paired with one of these quartiles
        #[arg(long, conflicts_with = "area")]
        quartile: Vec<String>,

        /// Only categories belonging to one of these areas
        #[arg(long)]
        area: Vec<String>,
    },

    /// List subject areas
    Areas {
        /// Only areas containing one of these categories
        #[arg(long)]
        category: Vec<String>,
    },

    /// Journals in the given categories at the given quartiles
    InCategories {
        #[arg(long)]
        category: Vec<String>,

        #[arg(long)]
        quartile: Vec<String>,
    },

    /// Journals in the given areas under the given licenses
    InAreas {
        #[arg(long)]
        area: Vec<String>,

        #[arg(long)]
        license: Vec<String>,
    },

    /// Journals without article-processing charges in the given areas,
    /// categories and quartiles
    Diamond {
        #[arg(long)]
        area: Vec<String>,

        #[arg(long)]
        category: Vec<String>,

        #[arg(long)]
        quartile: Vec<String>,
    },
}

/// At most one journal filter; none lists every journal.
#[derive(Args)]
#[group(multiple = false)]
pub struct JournalFilter {
    /// Title contains this text (case-insensitive)
    #[arg(long)]
    pub title: Option<String>,

    /// Publisher contains this text (case-insensitive)
    #[arg(long)]
    pub publisher: Option<String>,

    /// Licensed under one of these licenses
    #[arg(long)]
    pub license: Vec<String>,

    /// Charges article-processing fees
    #[arg(long)]
    pub apc: bool,

    /// Holds the DOAJ seal
    #[arg(long)]
    pub seal: bool,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            command => {
                let config = Config::load()?;
                let engine = connect_engine(&config).await?;
                let output = query::run(command, &engine).await?;
                println!("{}", serde_json::to_string_pretty(&output)?);
                Ok(())
            }
        }
    }
}

/// Builds an engine with every configured store registered, in order.
pub async fn connect_engine(config: &Config) -> Result<QueryEngine, AppError> {
    let mut engine = QueryEngine::new().with_failure_policy(config.engine.failure_policy);

    for store in &config.journal_stores {
        let client = PostgresClient::connect(&store.uri, &store.graph).await?;
        engine.add_journal_store(Arc::new(GraphJournalStore::new(&store.name, client)));
    }
    for store in &config.category_stores {
        let client = PostgresClient::connect_sql(&store.uri).await?;
        engine.add_category_store(Arc::new(SqlCategoryStore::new(&store.name, client)));
    }

    tracing::debug!(
        journal_stores = engine.journal_stores().len(),
        category_stores = engine.category_stores().len(),
        "Engine ready"
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_journal_filters() {
        let app = App::parse_from([
            "bibliofed",
            "journals",
            "--license",
            "CC BY",
            "--license",
            "CC0",
        ]);
        match app.command {
            Command::Journals(filter) => assert_eq!(filter.license, vec!["CC BY", "CC0"]),
            _ => panic!("expected journals"),
        }

        assert!(App::try_parse_from(["bibliofed", "journals", "--apc", "--seal"]).is_err());
    }

    #[test]
    fn test_parse_diamond() {
        let app = App::parse_from([
            "bibliofed",
            "-v",
            "diamond",
            "--area",
            "1700",
            "--quartile",
            "Q1",
        ]);
        assert!(app.verbose);
        match app.command {
            Command::Diamond {
                area,
                category,
                quartile,
            } => {
                assert_eq!(area, vec!["1700"]);
                assert!(category.is_empty());
                assert_eq!(quartile, vec!["Q1"]);
            }
            _ => panic!("expected diamond"),
        }
    }

    #[test]
    fn test_categories_filters_conflict() {
        assert!(App::try_parse_from([
            "bibliofed",
            "categories",
            "--quartile",
            "Q1",
            "--area",
            "1700",
        ])
        .is_err());
    }

    #[tokio::test]
    async fn test_connect_engine_registers_in_order() {
        let config: Config = figment::Figment::new()
            .merge(figment::providers::Serialized::defaults(serde_json::json!({
                "engine": { "failure_policy": "propagate" },
                "journal_stores": [
                    { "name": "doaj", "uri": "postgresql://localhost/a", "graph": "journals" },
                    { "name": "local", "uri": "postgresql://localhost/b", "graph": "journals" }
                ],
                "category_stores": [
                    { "name": "scimago", "uri": "postgresql://localhost/a" }
                ]
            })))
            .extract()
            .unwrap();

        let engine = connect_engine(&config).await.unwrap();

        let names: Vec<_> = engine.journal_stores().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["doaj", "local"]);
        assert_eq!(engine.category_stores()[0].name(), "scimago");
        assert_eq!(engine.failure_policy(), crate::engine::FailurePolicy::Propagate);
    }
}
