// sqlx::Error -> AppError
//
// Transport trouble becomes BackendUnavailable, shape trouble becomes
// MalformedResponse; the scaling poll surfaces both unchanged.

use queuescale_core::error::AppError;

pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite result codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some("2067") | Some("1555") => AppError::InvalidState(format!(
                    "Unique constraint violation: {}",
                    db_err.message()
                )),
                Some("787") => AppError::NotFound(format!(
                    "Foreign key constraint violation: {}",
                    db_err.message()
                )),
                Some("5") => AppError::BackendUnavailable(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                Some(code) => AppError::BackendUnavailable(format!(
                    "Database error [{}]: {}",
                    code,
                    db_err.message()
                )),
                None => AppError::BackendUnavailable(format!(
                    "Database error: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => AppError::MalformedResponse(err.to_string()),
        // Io, Tls, Protocol, PoolTimedOut, PoolClosed, WorkerCrashed, ...
        _ => AppError::BackendUnavailable(err.to_string()),
    }
}
