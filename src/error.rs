use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid URL")]
    InvalidUrl,
    /// Malformed, unknown and expired ids all collapse into this variant.
    #[error("invalid paste")]
    InvalidPaste,
    #[error("wrong delete key")]
    Unauthorized,
    #[error("missing delete key")]
    MissingDeleteKey,
    /// Primary key collision on insert. Retried by the store, never returned to callers.
    #[error("paste id already taken")]
    IdConflict,
    #[error("database error")]
    Database { source: sqlx::Error },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            AppError::InvalidPaste => StatusCode::NOT_FOUND,
            AppError::InvalidUrl => StatusCode::BAD_REQUEST,
            AppError::MissingDeleteKey => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::IdConflict => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status_code.is_server_error() {
            tracing::error!("request failed: {self:?}");
        }

        (status_code, format!("{self}")).into_response()
    }
}

/// Codes reported for primary key violations: sqlite primary and extended result codes, then SQLSTATEs.
const UNIQUE_VIOLATION_CODES: &[&str] = &["19", "1555", "2067", "23000", "23505"];

impl From<sqlx::Error> for AppError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::RowNotFound => AppError::InvalidPaste,
            sqlx::Error::Database(ref db_err)
                if db_err
                    .code()
                    .is_some_and(|code| UNIQUE_VIOLATION_CODES.contains(&&*code)) =>
            {
                AppError::IdConflict
            }
            _ => AppError::Database { source },
        }
    }
}
