use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{
    HttpResponse,
    ResponseError,
};
use custom_error::custom_error;

use crate::auth::AuthError;
use crate::domain::MalformedInput;

/// One rejected field of a request body.
#[derive(Clone, Debug, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<MalformedInput> for FieldError {
    fn from(error: MalformedInput) -> Self {
        FieldError {
            field: error.field().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct FieldErrors(pub Vec<FieldError>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

custom_error! {
///! Error inside a controller action.
pub ApiError
    AuthError{source: AuthError} = "{source}",
    Forbidden = "the caller is not entitled to this action",
    NotFound = "the requested resource does not exist",
    BadRequest{message: String} = "{message}",
    ValidationFailed{errors: FieldErrors} = "invalid input: {errors}",
    DatabaseError{source: sqlx::Error} = "{source}",
    HashingError{source: argon2::password_hash::Error} = "{source}",
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthError {
                source: AuthError::PendingPasswordChange,
            } => StatusCode::FORBIDDEN,
            ApiError::AuthError {
                source: AuthError::DatabaseError { .. },
            } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::AuthError { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError { .. } | ApiError::HashingError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::ValidationFailed { errors } => HttpResponse::UnprocessableEntity()
                .json(serde_json::json!({ "errors": errors.0 })),
            ApiError::BadRequest { message } => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
            }
            _ => HttpResponse::build(self.status_code()).finish(),
        }
    }
}
