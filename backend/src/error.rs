use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::upload::UploadError;
use crate::validation::ValidationError;

impl From<UploadError> for ValidationError {
    fn from(err: UploadError) -> Self {
        ValidationError::InvalidForm(err.to_string())
    }
}

impl From<&ValidationError> for ErrorResponse {
    fn from(err: &ValidationError) -> Self {
        let errors = match err {
            ValidationError::InvalidFiles(errors) => errors.clone(),
            _ => Vec::new(),
        };
        ErrorResponse {
            error: err.category().to_string(),
            message: err.to_string(),
            field: err.field().map(str::to_string),
            errors,
            success: false,
        }
    }
}

impl ResponseError for ValidationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self))
    }
}
