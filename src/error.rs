use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde_json::{Value, json};
use thiserror::Error;

use crate::cache::CacheError;

/// Failure of a single (possibly multi-page) Graph API read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("{details}")]
    Upstream { status: u16, details: String },
    #[error("Failed to parse JSON: {0}")]
    InvalidJson(String),
    #[error("No data or error in response")]
    MissingData,
    #[error("Pagination limit of {0} pages exceeded")]
    LimitExceeded(usize),
}

impl FetchError {
    /// Lifts the failure to a request-level error, prefixed with what was being fetched.
    pub fn into_app(self, context: &str) -> AppError {
        match self {
            FetchError::Upstream { status, details } => AppError::Upstream {
                message: context.to_string(),
                status,
                details,
            },
            FetchError::LimitExceeded(limit) => AppError::PaginationLimitExceeded(limit),
            other => AppError::Upstream {
                message: context.to_string(),
                status: Status::BadGateway.code,
                details: other.to_string(),
            },
        }
    }
}

/// Errors surfaced to the dashboard as JSON bodies.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}: {details}")]
    Upstream {
        message: String,
        status: u16,
        details: String,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("Pagination limit of {0} pages exceeded")]
    PaginationLimitExceeded(usize),
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Upstream { status, .. } => {
                Status::from_code(*status).unwrap_or(Status::BadGateway)
            }
            AppError::NotFound(_) => Status::NotFound,
            AppError::PaginationLimitExceeded(_) => Status::BadGateway,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            AppError::Upstream {
                message, details, ..
            } => json!({ "error": message, "details": details }),
            AppError::NotFound(message) => json!({ "error": message }),
            AppError::PaginationLimitExceeded(limit) => json!({
                "error": "Pagination limit exceeded",
                "details": format!("Upstream kept paginating past {} pages", limit),
            }),
            AppError::Internal(details) => {
                json!({ "error": "Internal Server Error", "details": details })
            }
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound => AppError::NotFound("No saved data found".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request failed");
        }
        (status, Json(self.body())).respond_to(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_keeps_status_and_raw_details() {
        let err = FetchError::Upstream {
            status: 400,
            details: r#"{"error":{"message":"bad token"}}"#.to_string(),
        }
        .into_app("Failed to fetch Ads");

        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.body()["error"], "Failed to fetch Ads");
        assert_eq!(err.body()["details"], r#"{"error":{"message":"bad token"}}"#);
    }

    #[test]
    fn limit_maps_to_its_own_kind() {
        let err = FetchError::LimitExceeded(3).into_app("Failed to fetch Ads");
        assert!(matches!(err, AppError::PaginationLimitExceeded(3)));
        assert_eq!(err.status(), Status::BadGateway);
    }

    #[test]
    fn missing_cache_is_not_found() {
        let err = AppError::from(CacheError::NotFound);
        assert_eq!(err.status(), Status::NotFound);
        assert_eq!(err.body(), json!({ "error": "No saved data found" }));
    }
}
