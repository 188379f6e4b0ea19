use crate::core::config::DatabaseConfig;
use crate::core::error::AppError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Postgres SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres SQLSTATE for unique violations
const UNIQUE_VIOLATION: &str = "23505";

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Map a failed write to the matching API error.
///
/// Foreign key violations mean the caller referenced a row that does not
/// exist (404), unique violations mean a conflicting row exists (409).
/// Anything else stays a database error and surfaces as a 500.
pub fn map_constraint_error(e: sqlx::Error, context: &str) -> AppError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match code.as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => {
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .unwrap_or("unknown");
            tracing::warn!("{}: foreign key violation on {}", context, constraint);
            AppError::NotFound(format!("{}: referenced record not found", context))
        }
        Some(UNIQUE_VIOLATION) => {
            tracing::warn!("{}: unique violation", context);
            AppError::Conflict(format!("{}: record already exists", context))
        }
        _ => {
            tracing::error!("{}: {:?}", context, e);
            AppError::Database(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_stays_database_error() {
        let err = map_constraint_error(sqlx::Error::RowNotFound, "Failed to update intervention");
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
