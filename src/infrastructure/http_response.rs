// HTTP response utilities: JSON envelopes and error mapping
use crate::domain::error::{ArmError, ErrorKind, Operation};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};

/// RFC 3339 UTC timestamp stamped on every response
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize `payload` and add a `timestamp` field
pub fn with_timestamp<T: Serialize>(payload: T) -> Json<Value> {
    let mut value = serde_json::to_value(payload).unwrap_or_else(|_| json!({}));
    if let Some(object) = value.as_object_mut() {
        object.insert("timestamp".to_string(), Value::String(timestamp()));
    }
    Json(value)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body or path did not have the expected shape
    #[error("{operation}: {message}")]
    Shape { operation: Operation, message: String },
    #[error(transparent)]
    Arm(#[from] ArmError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Shape { .. } => ErrorKind::BadRequest,
            ApiError::Arm(e) => e.kind(),
        }
    }

    /// - bad request: 400
    /// - out of range: 422
    /// - not ready / driver error: 503
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::OutOfRange => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotReady | ErrorKind::DriverError => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = json!({
            "error": self.kind().as_str(),
            "message": self.to_string(),
            "timestamp": timestamp(),
        });
        (status, Json(body)).into_response()
    }
}
