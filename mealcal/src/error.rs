use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MealError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Store request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Collection '{0}' is not provisioned in the store")]
    MissingCollection(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data unavailable after {attempts} attempts: {source}")]
    DataUnavailable {
        attempts: u32,
        #[source]
        source: Arc<MealError>,
    },

    #[error("Failed to save {what}: {source}")]
    SaveFailed {
        what: &'static str,
        #[source]
        source: Box<MealError>,
    },

    #[error("Failed to delete {what}: {source}")]
    DeleteFailed {
        what: &'static str,
        #[source]
        source: Box<MealError>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MealError {
    /// Transport-level failures that a repeated request may cure.
    pub fn is_retryable(&self) -> bool {
        match self {
            MealError::Timeout(_) | MealError::Io(_) => true,
            MealError::Database(inner) => is_transport_failure(inner),
            _ => false,
        }
    }

    /// Configuration problems are never retried and are surfaced unchanged.
    pub fn is_configuration(&self) -> bool {
        matches!(self, MealError::Config(_) | MealError::MissingCollection(_))
    }

    /// Refine a raw libSQL error into the store error taxonomy.
    ///
    /// SQLite reports both conditions only through the message text.
    pub fn classify(self) -> Self {
        let MealError::Database(ref inner) = self else {
            return self;
        };
        let message = inner.to_string();

        if let Some(idx) = message.find("no such table:") {
            let table = message[idx + "no such table:".len()..]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
                .to_string();
            return MealError::MissingCollection(table);
        }

        if message.contains("constraint failed") {
            return MealError::Conflict(message);
        }

        self
    }
}

pub type Result<T> = std::result::Result<T, MealError>;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_IOERR: i32 = 10;

fn is_transport_failure(error: &libsql::Error) -> bool {
    match error {
        libsql::Error::ConnectionFailed(_)
        | libsql::Error::Hrana(_)
        | libsql::Error::WriteDelegation(_)
        | libsql::Error::Replication(_) => true,
        libsql::Error::SqliteFailure(code, _) => is_transient_code(*code),
        libsql::Error::RemoteSqliteFailure(code, extended, _) => {
            is_transient_code(*code) || is_transient_code(*extended)
        }
        _ => false,
    }
}

/// Extended result codes carry the primary code in the low byte.
fn is_transient_code(code: i32) -> bool {
    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED | SQLITE_IOERR)
}
