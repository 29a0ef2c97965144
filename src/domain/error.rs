//! Error taxonomy for the mapping engine.
//!
//! Three kinds only. A missing row is not an error: lookups return `Option`.

use crate::domain::binding::CrudOperation;

/// Errors surfaced by bindings, repositories and the row decoder.
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    /// No usable SQL for an operation, or an entity graph that cannot be
    /// written as-is. Signals a development-time mistake; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An insert failed. Carries the entity's debug text for diagnosis.
    #[error("unable to save {entity}")]
    Persistence {
        entity: String,
        #[source]
        source: sqlx::Error,
    },

    /// An update, delete or query failed, including column decode failures.
    #[error("{operation} failed")]
    Operation {
        operation: CrudOperation,
        #[source]
        source: sqlx::Error,
    },
}

impl OrmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        OrmError::Configuration(message.into())
    }

    pub fn operation(operation: CrudOperation, source: sqlx::Error) -> Self {
        OrmError::Operation { operation, source }
    }

    /// True for `Configuration` errors; handy in tests and in the preflight report.
    pub fn is_configuration(&self) -> bool {
        matches!(self, OrmError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;
