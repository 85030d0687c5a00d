//! Mapping from service errors to HTTP responses
//!
//! Guard and lifecycle errors carry distinct kinds; this is the single
//! place where they become status codes. Control-plane and database
//! failures are logged in full and returned with a safe generic message.

use axum::{http::StatusCode, Json};
use hackdesk_control::ControlError;
use tracing::error;

use crate::models::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(err: ControlError) -> ApiError {
    let (status, code, message) = match &err {
        ControlError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            err.to_string(),
        ),
        ControlError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
        ControlError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        ControlError::FeatureDisabled => (
            StatusCode::FORBIDDEN,
            "FEATURE_DISABLED",
            err.to_string(),
        ),
        ControlError::InvalidConfig(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_CONFIG",
            err.to_string(),
        ),
        ControlError::Conflict => (StatusCode::CONFLICT, "CONFLICT", err.to_string()),
        ControlError::ClusterNotReady => (
            StatusCode::CONFLICT,
            "CLUSTER_NOT_READY",
            err.to_string(),
        ),
        ControlError::UserLimitReached(_) => (
            StatusCode::CONFLICT,
            "USER_LIMIT_REACHED",
            err.to_string(),
        ),
        ControlError::ProvisioningFailed(detail) => {
            error!(detail = %detail, "Cluster provisioning failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVISIONING_FAILED",
                "Cluster provisioning failed".to_string(),
            )
        }
        ControlError::DeletionFailed(detail) => {
            error!(detail = %detail, "Cluster deletion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DELETION_FAILED",
                "Cluster deletion failed".to_string(),
            )
        }
        ControlError::StatusCheckFailed(detail) => {
            error!(detail = %detail, "Cluster status check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STATUS_CHECK_FAILED",
                "Cluster status check failed".to_string(),
            )
        }
        ControlError::Database(db_err) => {
            error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            )
        }
        ControlError::Password(pw_err) => {
            error!(error = %pw_err, "Password hashing error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            )
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: message,
            code: Some(code.to_string()),
        }),
    )
}
