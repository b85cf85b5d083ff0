use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{error, warn};

use crate::application::dto::DetectResponse;
use crate::domain::errors::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::MissingInput | DomainError::Decode(_) | DomainError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::DetectionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Detection error: {}", self);
        } else {
            warn!("Rejected request ({}): {}", status.as_u16(), self);
        }
        (status, Json(DetectResponse::error(self.to_string()))).into_response()
    }
}
