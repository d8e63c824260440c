use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Table name '{0}' must be non-empty and contain only ASCII letters, digits and '_'")]
    InvalidTableName(String),

    #[error("SQLite operation failed")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to convert frame for loading")]
    Polars(#[from] PolarsError),

    #[error("Failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("No parquet parts found in '{0}'")]
    NoParts(PathBuf),
}
