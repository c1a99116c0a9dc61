use actix_web::error::JsonPayloadError;
use actix_web::{http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use std::fmt;

/// Application error taxonomy, mapped to HTTP at the handler boundary.
///
/// Every failure a handler can surface is one of these variants; the
/// `ResponseError` impl turns it into a `{"error": "..."}` JSON body.
/// Internal detail (database faults, IO faults) never reaches the client,
/// only the server log.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or rejected input (bad email format, invalid ids).
    Validation(String),
    /// Unknown email or wrong password. One message for both so the
    /// response does not reveal which accounts exist.
    InvalidCredentials,
    /// Protected route called without an Authorization header.
    NoToken,
    /// Token failed signature, shape or expiry checks.
    InvalidToken,
    /// Authenticated caller does not own the addressed resource.
    NotOwner,
    NotFound(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    Database(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid Credentials"),
            AppError::NoToken => write!(f, "No token"),
            AppError::InvalidToken => write!(f, "Token is not valid"),
            AppError::NotOwner => write!(f, "Not authorized"),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "{}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "{}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials | AppError::InvalidToken => {
                StatusCode::BAD_REQUEST
            }
            AppError::NoToken | AppError::NotOwner => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("❌ {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

/// Maps body-deserialization failures onto the same `{"error": ...}` shape
/// every other 4xx uses. Registered through `web::JsonConfig` in main.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}
