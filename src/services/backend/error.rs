use crate::services::ledger::LedgerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// An HTTP error with a Django-REST-shaped JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn detail(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
        }
    }

    /// Field-level validation error: `{"<field>": ["<message>"]}`.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ field: [message.into()] }),
        }
    }

    pub fn unauthorized() -> Self {
        Self::detail(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        )
    }

    pub fn not_found() -> Self {
        Self::detail(StatusCode::NOT_FOUND, "Not found.")
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ContractNotFound(_) => Self::not_found(),
            LedgerError::InvalidTitle => Self::field("title", e.to_string()),
            LedgerError::InvalidClause(_) => Self::field("selected_clauses", e.to_string()),
            LedgerError::EmptyChangeSummary => Self::field("change_summary", e.to_string()),
            LedgerError::UnknownStatus(_) => Self::field("status", e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn ledger_errors_map_to_rest_statuses() {
        let nf: ApiError = LedgerError::ContractNotFound(Uuid::nil()).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.body["detail"], "Not found.");

        let bad: ApiError = LedgerError::InvalidClause("x y".to_string()).into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert!(bad.body["selected_clauses"][0]
            .as_str()
            .unwrap_or("")
            .contains("invalid clause"));
    }
}
