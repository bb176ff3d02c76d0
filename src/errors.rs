use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::JsonResponse;

const UNIQUE_VIOLATION: &str = "UNIQUE constraint failed";
const FOREIGN_KEY_VIOLATION: &str = "FOREIGN KEY constraint failed";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{message}: {details}")]
    InvalidBody {
        message: &'static str,
        details: String,
    },
    /// Missing and not-owned records share this variant.
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("internal server error")]
    ServerError,
    #[error("database error: {0}")]
    DatabaseError(sqlx::Error),
}

#[derive(Debug, Serialize)]
pub struct RequestErrorJson {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RequestErrorJson {
    pub fn new(error: &str) -> RequestErrorJson {
        RequestErrorJson {
            error: error.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, details: &str) -> RequestErrorJson {
        RequestErrorJson {
            error: error.to_string(),
            details: Some(details.to_string()),
        }
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(e) = &value {
            if e.message().contains(UNIQUE_VIOLATION) {
                return Self::Conflict("Record already exists");
            }
            if e.message().contains(FOREIGN_KEY_VIOLATION) {
                return Self::NotFound("Referenced record not found");
            }
        }
        Self::DatabaseError(value)
    }
}

impl From<JsonRejection> for RequestError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidBody {
            message: "Invalid JSON",
            details: value.body_text(),
        }
    }
}

impl From<QueryRejection> for RequestError {
    fn from(value: QueryRejection) -> Self {
        Self::InvalidBody {
            message: "Invalid query string",
            details: value.body_text(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    /// Relabels a storage uniqueness conflict with a caller-facing reason.
    pub fn conflict_as(self, reason: &'static str) -> Self {
        match self {
            RequestError::Conflict(_) => RequestError::Conflict(reason),
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            RequestError::InvalidArgument(_)
            | RequestError::InvalidBody { .. }
            | RequestError::Conflict(_) => StatusCode::BAD_REQUEST,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::ServerError | RequestError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJson> {
        let json = match self {
            RequestError::Unauthenticated(message)
            | RequestError::NotFound(message)
            | RequestError::Conflict(message) => RequestErrorJson::new(message),
            RequestError::InvalidArgument(message) => RequestErrorJson::new(message),
            RequestError::InvalidBody { message, details } => {
                RequestErrorJson::with_details(message, details)
            }
            RequestError::ServerError => RequestErrorJson::new("Internal Server Error"),
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                RequestErrorJson::new("Internal Server Error")
            }
        };
        (self.status_code(), Json(json))
    }
}
