use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::openai_client::OpenAiError;

/// Uniform JSON envelope used for every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub pagination: Pagination,
}

pub fn ok<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    with_status(StatusCode::OK, data, message)
}

pub fn created<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    with_status(StatusCode::CREATED, data, message)
}

fn with_status<T: Serialize>(
    status: StatusCode,
    data: T,
    message: &str,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        status,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
            error: None,
        }),
    )
}

pub fn paginated<T: Serialize>(
    data: Vec<T>,
    page: u32,
    limit: u32,
    total: u32,
    message: &str,
) -> Json<PaginatedResponse<T>> {
    let limit = limit.max(1);
    // Widen before the rounding add; `limit` is caller-supplied.
    let total_pages = ((total as u64 + limit as u64 - 1) / limit as u64) as u32;
    Json(PaginatedResponse {
        success: true,
        data,
        message: Some(message.to_string()),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
        },
    })
}

/// Error taxonomy surfaced directly as HTTP status + envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("Failed to generate AI response")]
    Generation(#[source] OpenAiError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Generation(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Generation(ref source) = self {
            tracing::error!("AI generation failed: {}", source);
        }

        let status = self.status();
        let body = match &self {
            ApiError::Validation(details) => json!({
                "success": false,
                "error": "Validation failed",
                "details": details,
            }),
            other => json!({
                "success": false,
                "error": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error_field() {
        let (status, Json(body)) = ok(vec![1, 2, 3], "retrieved");
        assert_eq!(status, StatusCode::OK);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "retrieved");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn validation_error_carries_field_details() {
        let err = ApiError::Validation(vec!["Email is required".to_string()]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_statuses_follow_taxonomy() {
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::ServiceUnavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let Json(body) = paginated(vec![1, 2], 1, 10, 21, "ok");
        assert_eq!(body.pagination.total_pages, 3);
        assert_eq!(body.pagination.total, 21);

        let Json(empty) = paginated(Vec::<i32>::new(), 1, 10, 0, "ok");
        assert_eq!(empty.pagination.total_pages, 0);
    }

    #[test]
    fn pagination_survives_extreme_query_values() {
        let Json(body) = paginated(vec![1], 1, u32::MAX, 2, "ok");
        assert_eq!(body.pagination.total_pages, 1);

        let Json(huge_page) = paginated(Vec::<i32>::new(), u32::MAX, u32::MAX, u32::MAX, "ok");
        assert_eq!(huge_page.pagination.total_pages, 1);
    }
}
