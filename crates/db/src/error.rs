use patrouille_core::error::CoreError;

/// Translate a sqlx error into the domain error the services propagate.
///
/// - `RowNotFound` maps to a not-found error.
/// - Unique violations on `uq_*` constraints map to `Conflict`, naming the
///   constraint.
/// - Foreign-key and check violations map to `Validation`.
/// - Everything else is logged and maps to `Internal` with a sanitized
///   message.
pub fn classify_sqlx_error(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::RowNotFound => CoreError::NotFoundByKey {
            entity: "Resource",
            key: "requested row".to_string(),
        },
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") if constraint.starts_with("uq_") => CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                )),
                // foreign_key_violation
                Some("23503") => CoreError::Validation(format!(
                    "Referenced row does not exist ({constraint})"
                )),
                // check_violation
                Some("23514") => {
                    CoreError::Validation(format!("Value rejected by constraint {constraint}"))
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    CoreError::Internal("A database error occurred".to_string())
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Internal("A database error occurred".to_string())
        }
    }
}
