// Mapping of domain errors onto HTTP responses
use crate::domain::error::PanelError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub struct ApiError(pub PanelError);

impl From<PanelError> for ApiError {
    fn from(error: PanelError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PanelError::Validation(_) => StatusCode::BAD_REQUEST,
            PanelError::NotFound { .. } => StatusCode::NOT_FOUND,
            PanelError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.0.to_string()).into_response()
    }
}
