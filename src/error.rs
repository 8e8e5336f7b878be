use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::leave::OverlappingLeave;

/// Every failure a request can end in. The variant decides the status code;
/// the display text becomes the `error` field of the response envelope.
#[derive(Debug, Display)]
pub enum AppError {
    /// Malformed input, reason length, date ordering.
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// Missing or unusable identity.
    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    /// Wrong role, not the direct manager, acting on one's own leave.
    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Wrong current status for the transition, finalized payroll run,
    /// leave type still referenced.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    Overlap(OverlappingLeave),

    #[display(
        fmt = "Insufficient leave balance: available {} day(s), requested {} day(s)",
        available,
        requested
    )]
    InsufficientBalance { available: f64, requested: f64 },

    /// Database or transaction failure. The inner text is for logs only.
    #[display(fmt = "Internal Server Error")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Overlap(existing) => Some(json!({ "conflicting_leave": existing })),
            AppError::InsufficientBalance {
                available,
                requested,
            } => Some(json!({ "available": available, "requested": requested })),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InsufficientBalance { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::Overlap(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                tracing::warn!(error = %e, "Unique constraint violated");
                return AppError::Conflict("A record with the same key already exists".into());
            }
            if db.is_foreign_key_violation() {
                tracing::warn!(error = %e, "Foreign key constraint violated");
                return AppError::Conflict("The record is still referenced by related data".into());
            }
        }
        tracing::error!(error = %e, "Database operation failed");
        AppError::Internal(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave::LeaveStatus;
    use actix_web::body::to_bytes;
    use chrono::NaiveDate;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(
            AppError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InsufficientBalance {
                available: 1.0,
                requested: 2.0
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("pool timed out".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn envelope_carries_message_and_success_flag() {
        let (status, body) = body_json(AppError::forbidden("Cannot approve your own leave")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Cannot approve your own leave");
        assert!(body.get("details").is_none());
    }

    #[actix_web::test]
    async fn internal_errors_hide_their_cause() {
        let (_, body) = body_json(AppError::Internal("deadlock on leaves".into())).await;
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[actix_web::test]
    async fn overlap_reports_the_conflicting_leave() {
        let existing = OverlappingLeave {
            id: 41,
            leave_type: "Sick Leave".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            status: LeaveStatus::Pending,
        };
        let (status, body) = body_json(AppError::Overlap(existing)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["error"],
            "Leave overlaps with existing Sick Leave leave #41 from 2026-03-02 to 2026-03-04 (status: Pending)"
        );
        assert_eq!(body["details"]["conflicting_leave"]["id"], 41);
        assert_eq!(body["details"]["conflicting_leave"]["status"], "Pending");
    }

    #[actix_web::test]
    async fn insufficient_balance_reports_amounts() {
        let (status, body) = body_json(AppError::InsufficientBalance {
            available: 2.0,
            requested: 3.0,
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["available"], 2.0);
        assert_eq!(body["details"]["requested"], 3.0);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Insufficient leave balance")
        );
    }

    #[derive(Debug)]
    struct ConstraintRejected {
        foreign_key: bool,
    }

    impl std::fmt::Display for ConstraintRejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("constraint rejected the statement")
        }
    }

    impl std::error::Error for ConstraintRejected {}

    impl sqlx::error::DatabaseError for ConstraintRejected {
        fn message(&self) -> &str {
            "constraint rejected the statement"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.foreign_key {
                sqlx::error::ErrorKind::ForeignKeyViolation
            } else {
                sqlx::error::ErrorKind::UniqueViolation
            }
        }
    }

    #[test]
    fn constraint_violations_are_conflicts_not_server_errors() {
        for foreign_key in [true, false] {
            let err = AppError::from(sqlx::Error::Database(Box::new(ConstraintRejected {
                foreign_key,
            })));
            assert_eq!(err.status_code(), StatusCode::CONFLICT, "foreign_key={foreign_key}");
        }
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
