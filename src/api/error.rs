use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::types::ErrorResponse;
use crate::validators::ValidationError;
use crate::AppError;

/// converts `AppError` into the HTTP status/body contract
///
/// `Config` and `Dependency` detail is logged server-side and replaced with
/// a generic message; internal error text never reaches a client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(AppError::Validation(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::CsrfRejected => (StatusCode::FORBIDDEN, "CSRF_REJECTED"),
            AppError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Config(_) | AppError::Dependency(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let error = match &self.0 {
            AppError::Config(detail) | AppError::Dependency(detail) => {
                log::error!(
                    target: "reviewbase::api",
                    "msg=\"internal error\" code=\"{code}\" detail=\"{detail}\""
                );
                "Operation failed".to_owned()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error,
            code: code.to_owned(),
        });

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after } = self.0 {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
