use analytics::AnalyticsError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Performance error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::Database(DbError::NotFound) => {
                (StatusCode::NOT_FOUND, DbError::NotFound.to_string())
            }
            AppError::Database(DbError::MalformedRow(record_err)) => {
                tracing::error!(error = %record_err, "Malformed row in the database.");
                (StatusCode::UNPROCESSABLE_ENTITY, record_err.to_string())
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Analytics(AnalyticsError::TransactionFetch(fetch_err)) => {
                tracing::error!(error = ?fetch_err, "Transaction fetch failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            // Undefined returns, overflow and malformed records: the figures
            // cannot be computed from the stored data.
            AppError::Analytics(analytics_err) => {
                tracing::warn!(error = %analytics_err, "Performance could not be computed.");
                (StatusCode::UNPROCESSABLE_ENTITY, analytics_err.to_string())
            }
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server configuration error occurred".to_string(),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::CoreError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn undefined_returns_are_unprocessable() {
        let err = AppError::from(AnalyticsError::UndefinedReturn {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        });
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(message.contains("2024-01-02"));
    }

    #[test]
    fn malformed_records_are_unprocessable() {
        let record = CoreError::MalformedRecord {
            record: "valuation",
            field: "value",
        };
        assert_eq!(
            status_of(AppError::from(AnalyticsError::Record(record.clone()))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::from(DbError::MalformedRow(record))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn storage_failures_do_not_leak_details() {
        let err = AppError::from(AnalyticsError::TransactionFetch("pool timed out".into()));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("pool"));
    }

    #[test]
    fn access_errors_map_to_their_status() {
        assert_eq!(status_of(AppError::from(DbError::NotFound)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::Unauthorized("no identity".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("read only".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::BadRequest("bad date".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
