use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use authz::{Denial, DenyReason};

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to parse cookie, please clear your cookies and try again")]
    MalformedCredential,

    #[error("session expired, please log in to continue")]
    Unauthorized,

    /// Authenticated, but the route's checks said no.
    #[error("you do not have the proper authorization to access this page")]
    Forbidden,

    /// A gated route named a resource that does not exist.
    #[error("resource not found: {0}")]
    UnknownResource(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    ///
    /// A policy denial answers 401 like a missing session does, and so does a
    /// gated lookup of a resource that does not exist. The error code tells
    /// them apart.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedCredential => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::UNAUTHORIZED,
            ApiError::UnknownResource(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::MalformedCredential => "MALFORMED_CREDENTIAL",
            ApiError::Unauthorized => "UNAUTHENTICATED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::UnknownResource(_) => "RESOURCE_NOT_FOUND",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "INVALID_INPUT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the caller. Server-side failures never expose detail.
    fn public_message(&self) -> String {
        match self {
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                "failed to verify authority or process the request".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Maps a gate denial onto the response the caller sees.
impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        let detail = denial
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match denial.reason {
            DenyReason::Unauthenticated => ApiError::Unauthorized,
            DenyReason::Forbidden => ApiError::Forbidden,
            DenyReason::InvalidInput => ApiError::BadRequest(detail),
            DenyReason::NotFound => ApiError::UnknownResource(detail),
            DenyReason::InternalError => ApiError::InternalError(detail),
        }
    }
}

impl From<database::DatabaseError> for ApiError {
    fn from(err: database::DatabaseError) -> Self {
        match err {
            database::DatabaseError::SubmissionNotFound(id) => {
                ApiError::NotFound(format!("submission with id {}", id))
            }
            database::DatabaseError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<user::UserError> for ApiError {
    fn from(err: user::UserError) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use authz::AuthzError;

    #[test]
    fn test_denial_status_mapping() {
        let cases = [
            (Denial::unauthenticated(), StatusCode::UNAUTHORIZED),
            (Denial::forbidden(), StatusCode::UNAUTHORIZED),
            (
                Denial::from_error(AuthzError::InvalidInput("bad id".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                Denial::from_error(AuthzError::NotFound("submission 3".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                Denial::from_error(AuthzError::Lookup("db down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Denial::from_error(AuthzError::InvalidResource("file quota".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (denial, expected) in cases {
            let reason = denial.reason;
            assert_eq!(ApiError::from(denial).status_code(), expected, "{}", reason);
        }
    }

    #[test]
    fn test_missing_resource_is_distinct_from_forbidden() {
        let missing = ApiError::from(Denial::from_error(AuthzError::NotFound("7".into())));
        let forbidden = ApiError::from(Denial::forbidden());
        assert_eq!(missing.status_code(), forbidden.status_code());
        assert_ne!(missing.error_code(), forbidden.error_code());
    }

    #[test]
    fn test_malformed_credential_is_bad_request() {
        assert_eq!(
            ApiError::MalformedCredential.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::InternalError("sqlite: database is locked".into());
        assert!(!err.public_message().contains("sqlite"));

        let err = ApiError::BadRequest("invalid submission id 'x'".into());
        assert!(err.public_message().contains("invalid submission id"));
    }
}
