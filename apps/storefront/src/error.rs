//! # App Error Type
//!
//! Everything that can stop the storefront binary before it is ready.

use larek_engine::{CatalogError, CommandError, ConfigError};

/// Startup failure.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog client error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("startup failed: {0}")]
    Startup(#[from] CommandError),
}

pub type AppResult<T> = Result<T, AppError>;
