// CoreError -> HTTP mapping

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::api::models::ApiResponse;
use crate::error::{CoreError, ErrorKind};

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::QueryExecutionFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ReferenceDataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // storage messages stay in the log, not the response body
        let message = match self {
            CoreError::QueryExecutionFailed { phase, message } => {
                tracing::error!(%phase, error = %message, "query failed");
                format!("query failed during {phase} phase")
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(message))
    }
}
