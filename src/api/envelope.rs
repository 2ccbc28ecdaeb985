use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SUCCESS_MESSAGE: &str = "success";
pub const FAILED_MESSAGE: &str = "failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self { success: true, message: SUCCESS_MESSAGE.to_string(), data: Some(data), errors: None }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        Self::failure_payload(json!({ "error": error.to_string() }))
    }

    pub fn failure_payload(errors: Value) -> Self {
        Self { success: false, message: FAILED_MESSAGE.to_string(), data: None, errors: Some(errors) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl Reply {
    pub fn ok(data: Value) -> Self {
        Self { status: StatusCode::OK, envelope: Envelope::success(data) }
    }

    pub fn error(status: StatusCode, error: impl fmt::Display) -> Self {
        Self { status, envelope: Envelope::failure(error) }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}
