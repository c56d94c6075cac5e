use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::TransferError;

const LOG_TARGET: &str = "server::error";

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

/// Precondition violations become 400s; everything else — an unsatisfiable
/// circuit, a missing/mismatched artifact, a serialization failure — is the
/// façade's fault or the prover's, never the caller's, so it's a 500 (§4.8).
impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InsufficientBalance { .. }
            | TransferError::SameAccount(_)
            | TransferError::IndexOutOfRange { .. }
            | TransferError::AmountTooLarge { .. } => ApiError::BadRequest(err.to_string()),
            TransferError::AccountNotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                error!(target = LOG_TARGET, %message, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn same_account_maps_to_bad_request() {
        let response = ApiError::from(TransferError::SameAccount(1)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn index_out_of_range_maps_to_bad_request() {
        let response = ApiError::from(TransferError::IndexOutOfRange { index: 9, max: 4 }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn setup_not_found_maps_to_internal_error() {
        let response = ApiError::from(TransferError::SetupNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
