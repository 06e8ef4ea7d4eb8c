//! Error responses in the backend's nested payload shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::api::{ErrorPayload, ErrorStack};
use crate::client::ClientError;

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request (bad key, unparsable amount)
    BadRequest(String),
    /// Failure reported by the backing store
    Client(ClientError),
}

fn payload(status: StatusCode, exception_type: &str, message: String) -> ErrorPayload {
    ErrorPayload {
        message: Some(message.clone()),
        name: Some(exception_type.to_string()),
        stack: Some(ErrorStack {
            exception_type: Some(exception_type.to_string()),
            message: Some(message),
            status_code: Some(status.as_u16()),
        }),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => {
                let status = StatusCode::BAD_REQUEST;
                (status, payload(status, "BadRequestException", msg))
            }
            AppError::Client(err) => {
                let (status, kind) = match &err {
                    ClientError::Validation { .. } => {
                        (StatusCode::BAD_REQUEST, "BadRequestException")
                    }
                    ClientError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFoundException"),
                    ClientError::Http { status, .. } => (
                        StatusCode::from_u16(*status)
                            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                        "WebApplicationException",
                    ),
                    ClientError::Cancelled { .. } | ClientError::Network { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailableException")
                    }
                    ClientError::Decode { .. } | ClientError::Configuration { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerErrorException")
                    }
                };
                if status.is_server_error() {
                    warn!(status = status.as_u16(), error = %err, "request failed");
                }
                (status, payload(status, kind, err.user_message()))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::Client(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::from(ClientError::validation("amount too large")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_injected_status_is_preserved() {
        let err = ClientError::http(503, ErrorPayload::from_message("maintenance"));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_payload_nests_message_in_stack() {
        let body = payload(StatusCode::NOT_FOUND, "NotFoundException", "gone".to_string());
        assert_eq!(body.display_message(), "gone");
        assert_eq!(body.stack.unwrap().status_code, Some(404));
    }
}
