//! Query-layer errors and the soft/hard failure split used by optional sub-queries

use tracing::warn;

/// Error surfaced by a read operation.
///
/// Never retried here; callers decide whether to try again.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Pool exhausted, closed, or the server could not be reached.
    #[error("database unavailable: {0}")]
    Unavailable(sqlx::Error),

    /// The statement itself failed (syntax, types, constraints, decoding).
    #[error("query failed: {0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        if is_connectivity(&err) {
            QueryError::Unavailable(err)
        } else {
            QueryError::Query(err)
        }
    }
}

/// Pool or transport failures, as opposed to a statement the server rejected
fn is_connectivity(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

/// How a failed optional sub-query should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The statement failed (missing table or column, permissions,
    /// statement timeout, decoding); fall back to a default.
    Soft,
    /// The database could not be reached; abort the operation.
    Hard,
}

/// Classify a sqlx error raised by an optional sub-query.
///
/// Any error the server reports for the statement degrades. Only pool and
/// transport failures are hard, so an unreachable database is still reported.
pub fn severity(err: &sqlx::Error) -> Severity {
    if is_connectivity(err) {
        Severity::Hard
    } else {
        Severity::Soft
    }
}

/// Result of an optional sub-query: either the real value or its documented default
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Fresh(T),
    Defaulted(T),
}

impl<T> Guarded<T> {
    /// Settle a sub-query outcome. Soft failures degrade to `fallback`,
    /// hard failures are returned as errors.
    pub fn settle(
        result: Result<T, sqlx::Error>,
        fallback: T,
        what: &'static str,
    ) -> Result<Self, QueryError> {
        match result {
            Ok(value) => Ok(Guarded::Fresh(value)),
            Err(err) => match severity(&err) {
                Severity::Soft => {
                    warn!(sub_query = what, error = %err, "Optional data unavailable, using default");
                    Ok(Guarded::Defaulted(fallback))
                }
                Severity::Hard => Err(err.into()),
            },
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Guarded::Defaulted(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Guarded::Fresh(value) | Guarded::Defaulted(value) => value,
        }
    }
}
