//! Error conversion helpers for route handlers

use axum::http::StatusCode;

/// Extension trait turning fallible calls into StatusCode responses while
/// keeping the underlying error on stderr with context.
pub trait LogErr<T> {
    /// Log the error with context and map to 500
    fn log_500(self, context: &str) -> Result<T, StatusCode>;

    /// Log the error with context and map to the given status
    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, StatusCode> {
        self.map_err(|e| {
            eprintln!("{}: {}", context, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }

    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode> {
        self.map_err(|e| {
            eprintln!("{}: {}", context, e);
            status
        })
    }
}
