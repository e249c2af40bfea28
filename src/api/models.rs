// API response bodies and error mapping

use crate::error::{ImportError, ReportError, StoreError};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(detail: ErrorDetail) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(detail),
        }
    }
}

/// Row- and field-attributed description of a failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("bad upload: {0}")]
    Upload(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn detail(&self) -> ErrorDetail {
        match self {
            ApiError::Import(ImportError::Validation {
                line,
                field,
                reason,
            }) => ErrorDetail {
                kind: "validation".to_string(),
                message: reason.clone(),
                line: Some(*line),
                field: Some(field.to_string()),
            },
            ApiError::Import(e) => ErrorDetail {
                kind: e.kind().to_string(),
                message: e.to_string(),
                line: None,
                field: None,
            },
            ApiError::Report(e) => ErrorDetail {
                kind: "report".to_string(),
                message: e.to_string(),
                line: None,
                field: None,
            },
            ApiError::Upload(message) => ErrorDetail {
                kind: "upload".to_string(),
                message: message.clone(),
                line: None,
                field: None,
            },
            ApiError::Internal(message) => ErrorDetail {
                kind: "internal".to_string(),
                message: message.clone(),
                line: None,
                field: None,
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Import(ImportError::Persistence(StoreError::Conflict { .. })) => {
                StatusCode::CONFLICT
            }
            ApiError::Import(ImportError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Import(_) | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Report(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::error(self.detail()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_detail_carries_line_and_field() {
        let err = ApiError::from(ImportError::validation(7, "price", "must be non-negative"));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.detail(),
            ErrorDetail {
                kind: "validation".to_string(),
                message: "must be non-negative".to_string(),
                line: Some(7),
                field: Some("price".to_string()),
            }
        );
    }

    #[test]
    fn test_status_codes() {
        let schema = ApiError::from(ImportError::Schema("missing".to_string()));
        assert_eq!(schema.status_code(), StatusCode::BAD_REQUEST);

        let conflict = ApiError::from(ImportError::from(StoreError::Conflict {
            product_id: "A".to_string(),
            message: "exists".to_string(),
        }));
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let upload = ApiError::Upload("not a csv".to_string());
        assert_eq!(upload.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(upload.detail().kind, "upload");

        let internal = ApiError::Internal("boom".to_string());
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
