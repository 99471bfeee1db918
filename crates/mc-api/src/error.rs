use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Lifecycle(#[from] mc_lifecycle::Error),

    #[error("minecraft status lookup failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use mc_lifecycle::Error as Lifecycle;

        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Lifecycle(
                Lifecycle::Precondition { .. } | Lifecycle::NoSnapshots | Lifecycle::NoPrimaryIps,
            ) => StatusCode::PRECONDITION_FAILED,
            ApiError::Lifecycle(Lifecycle::UnknownSize(_)) => StatusCode::BAD_REQUEST,
            ApiError::Lifecycle(Lifecycle::Cloud(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Lifecycle(Lifecycle::MissingEnv(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
