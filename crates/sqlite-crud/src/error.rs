use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open database: {}: {source}", .path.display())]
    DbOpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Sql(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("identifier rejected by strict mode: {0}")]
    UnsafeIdentifier(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("item {item}: {source}")]
    ItemFailed {
        item: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Sql(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        AppError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DbOpenFailed { .. } => "DB_OPEN_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Sql(_) => "SQL_ERROR",
            AppError::Io { .. } => "IO_ERROR",
            AppError::UnsafeIdentifier(_) => "UNSAFE_IDENTIFIER",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::ItemFailed { source, .. } => source.code(),
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    /// Coarse error kind shared by every front end.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::DbOpenFailed { .. } => "OpenError",
            AppError::Validation(_) | AppError::UnsafeIdentifier(_) | AppError::Json(_) => {
                "ValidationError"
            }
            AppError::Sql(_) => "SqlError",
            AppError::Io { .. } => "IOError",
            AppError::ItemFailed { source, .. } => source.kind(),
            AppError::Timeout(_) | AppError::Internal(_) => "InternalError",
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
