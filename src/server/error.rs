//! Errors returned by the report handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    /// The run did not publish this file into the assets directory
    #[error("{0} has not been published")]
    ArtifactMissing(String),

    #[error("failed to read artifact: {0}")]
    ArtifactRead(#[from] std::io::Error),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::ArtifactMissing(_) => StatusCode::NOT_FOUND,
            ServerError::ArtifactRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ServerError::ArtifactRead(e) = &self {
            tracing::error!(detail = %e, "Artifact read failed");
        }

        let body = Json(json!({
            "error": true,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_status_codes() {
        let missing = ServerError::ArtifactMissing("force_plot_instance.html".to_string());
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "force_plot_instance.html has not been published");

        let read = ServerError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(read.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
