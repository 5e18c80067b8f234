//! Application error types.

use thiserror::Error;

/// Application-level errors for bibliofed.
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("Query error: {message}")]
    Query { message: String, query: String },

    #[error("Store '{store}' unavailable: {message}")]
    StoreUnavailable { store: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    // Input errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Wraps any store-side failure as [`AppError::StoreUnavailable`] for the named store.
    ///
    /// Errors that already carry a store name are returned unchanged.
    pub fn unavailable(store: &str, err: AppError) -> Self {
        match err {
            AppError::StoreUnavailable { .. } => err,
            other => AppError::StoreUnavailable {
                store: store.to_string(),
                message: other.to_string(),
            },
        }
    }
}
