//! Mapping of datastore failures onto the gateway error taxonomy

use grnwood_core::{ErrorContext, GrnwoodError, GrnwoodResult};

/// Translate a sqlx error raised during `operation`.
///
/// Unique index violations become `ConstraintViolation`, pool and transport
/// failures become `Connectivity`, an absent row becomes `NotFound`, and
/// everything else is a `Storage` failure.
pub(crate) fn map_sqlx_error(err: sqlx::Error, operation: &str) -> GrnwoodError {
    let context = ErrorContext::new("graph").with_operation(operation);
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            GrnwoodError::ConstraintViolation {
                message: db_err.message().to_string(),
                constraint: db_err.constraint().map(str::to_string),
                context,
            }
        }
        sqlx::Error::RowNotFound => GrnwoodError::NotFound {
            resource: "record".to_string(),
            context,
        },
        transport @ (sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed) => GrnwoodError::Connectivity {
            message: transport.to_string(),
            source: Some(Box::new(transport)),
            context: context.with_suggestion("Check that the graph datastore is reachable"),
        },
        other => GrnwoodError::Storage {
            message: other.to_string(),
            source: Some(Box::new(other)),
            context,
        },
    }
}

/// Turn a `NotFound` result into `Ok(None)` so callers can branch on presence
pub trait OptionalExt<T> {
    fn optional(self) -> GrnwoodResult<Option<T>>;
}

impl<T> OptionalExt<T> for GrnwoodResult<T> {
    fn optional(self) -> GrnwoodResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(GrnwoodError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
