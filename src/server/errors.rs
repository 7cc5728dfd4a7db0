use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::{CoreError, CoreErrorKind, ScenarioError};

/// Error returned by every API handler.
#[derive(Debug)]
pub struct ApiError(CoreError);

impl ApiError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self(CoreError::not_found(entity, id))
    }

    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            CoreErrorKind::NotFound => StatusCode::NOT_FOUND,
            CoreErrorKind::Validation => StatusCode::BAD_REQUEST,
            CoreErrorKind::Conflict => StatusCode::CONFLICT,
            CoreErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            CoreErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.0.kind() {
            CoreErrorKind::NotFound => "not_found",
            CoreErrorKind::Validation => "validation_failed",
            CoreErrorKind::Conflict => "conflict",
            CoreErrorKind::Unavailable => "service_unavailable",
            CoreErrorKind::Internal => "internal_error",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl From<ScenarioError> for ApiError {
    fn from(err: ScenarioError) -> Self {
        Self(CoreError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CoreError::validation(format!(
            "Invalid JSON: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let field = self
            .0
            .fields()
            .and_then(|fields| fields.get("field"))
            .cloned();

        let mut body = json!({
            "error": self.code(),
            "message": self.0.message(),
        });
        if let Some(field) = field {
            body["field"] = json!(field);
        }

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::from(ScenarioError::missing("message")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ScenarioError::AlreadyExists("start".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::not_found("Option", "7").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CoreError::unavailable("down")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
