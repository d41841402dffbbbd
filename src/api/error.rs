//! HTTP status mapping for facade errors.
//!
//! Every error body is `{"error": "<message>"}`.

use poem::http::StatusCode;
use poem::{Response, error::ResponseError};
use serde_json::json;

use crate::remote::error::CoreError;

/// Render an error as the JSON error body.
pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    Response::builder()
        .status(status)
        .content_type("application/json")
        .body(json!({ "error": message }).to_string())
}

impl ResponseError for CoreError {
    fn status(&self) -> StatusCode {
        match self {
            CoreError::SessionNotFound => StatusCode::UNAUTHORIZED,
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Execution { .. } | CoreError::Parse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        error_response(self.status(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::error::ExecutionError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(CoreError::SessionNotFound.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(CoreError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(CoreError::not_found("image x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            CoreError::parse("inspect", "eof").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CoreError::execution("uptime", ExecutionError::Channel("closed".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = CoreError::not_found("image ghost").as_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.into_body().into_string().await.unwrap();
        assert_eq!(body, r#"{"error":"image ghost not found"}"#);
    }
}
