use crate::core::QuoteError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Body of every non-success response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Maps provider failures onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(pub QuoteError);

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            QuoteError::Upstream { .. } | QuoteError::Parse { .. } => StatusCode::BAD_GATEWAY,
            QuoteError::NotFound(_) => StatusCode::NOT_FOUND,
            QuoteError::InvalidPage(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self.0, "Upstream request failed");
        } else {
            warn!(error = %self.0, "Rejected request");
        }

        let body = Message {
            message: self.0.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
