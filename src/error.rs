use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::shipment::BlockingShipment;

pub const SHIPMENT_LOCKED_MESSAGE: &str =
    "This shipment can no longer be modified, it has already shipped or been delivered.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("{}", SHIPMENT_LOCKED_MESSAGE)]
    ShipmentLocked,

    #[error(
        "Cannot delete this {entity} because it is linked to one or more shipments. \
         Cancel or delete those shipments first."
    )]
    StillReferenced {
        entity: &'static str,
        blocking: Vec<BlockingShipment>,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Message safe to show to users; server-side failures stay generic.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::WebSocket(_) => "WebSocket error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Json(_) => "JSON error".to_string(),
            _ => self.to_string(),
        }
    }

    /// True when the underlying store rejected the operation because a row is still referenced.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_foreign_key_violation() || mentions_foreign_key(db_err.message())
            }
            AppError::Database(err) => mentions_foreign_key(&err.to_string()),
            _ => false,
        }
    }
}

/// Store error messages differ between drivers ("FOREIGN KEY constraint failed",
/// "violates foreign key constraint ..."), so match on the lower-cased text.
pub fn mentions_foreign_key(message: &str) -> bool {
    message.to_lowercase().contains("foreign key")
}

// Convert AppError to an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ShipmentLocked | AppError::StillReferenced { .. } => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::WebSocket(_)
            | AppError::Internal(_)
            | AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(?self);
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocking_shipments: Vec<BlockingShipment>,
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        let error = err.public_message();
        let blocking_shipments = match err {
            AppError::StillReferenced { blocking, .. } => blocking,
            _ => Vec::new(),
        };

        Self {
            error,
            blocking_shipments,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::status::Status;

    #[test]
    fn test_foreign_key_message_detection() {
        assert!(mentions_foreign_key("FOREIGN KEY constraint failed"));
        assert!(mentions_foreign_key(
            "update or delete on table \"clients\" violates foreign key constraint"
        ));
        assert!(!mentions_foreign_key("UNIQUE constraint failed: clients.id"));
    }

    #[test]
    fn test_plain_errors_are_not_foreign_key_violations() {
        assert!(!AppError::ShipmentLocked.is_foreign_key_violation());
        assert!(!AppError::Database(sqlx::Error::RowNotFound).is_foreign_key_violation());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::not_found("client", "c1"), StatusCode::NOT_FOUND),
            (AppError::validation("name is required"), StatusCode::BAD_REQUEST),
            (AppError::ShipmentLocked, StatusCode::CONFLICT),
            (
                AppError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_blocking_shipments_are_exposed() {
        let err = AppError::StillReferenced {
            entity: "client",
            blocking: vec![BlockingShipment {
                id: "s1".to_string(),
                name: Some("Pallets".to_string()),
                status: Status::NotDeparted,
            }],
        };

        let body = ErrorResponse::from(err);
        assert!(body.error.contains("linked to one or more shipments"));
        assert_eq!(body.blocking_shipments.len(), 1);
        assert_eq!(body.blocking_shipments[0].id, "s1");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let body = ErrorResponse::from(AppError::Internal("secret path".to_string()));
        assert_eq!(body.error, "Internal server error");
        assert!(body.blocking_shipments.is_empty());
    }
}
