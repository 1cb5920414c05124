//! HTTP error responses for guardrail outcomes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use shelter_types::{Finding, PipelineResult};

/// JSON body returned when a request is rejected by the guardrails.
#[derive(Debug, Serialize)]
pub struct GuardrailErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<FindingSummary>,
}

/// Wire form of a finding, without spans or redacted values.
#[derive(Debug, Serialize)]
pub struct FindingSummary {
    pub validator: String,
    pub category: String,
    pub description: String,
    pub severity: f64,
}

impl From<&Finding> for FindingSummary {
    fn from(f: &Finding) -> Self {
        Self {
            validator: f.validator.clone(),
            category: f.category.clone(),
            description: f.description.clone(),
            severity: f.severity,
        }
    }
}

/// Guardrail error that can be converted to an HTTP response
pub struct GuardrailErrorResponse {
    pub status: StatusCode,
    pub body: GuardrailErrorBody,
}

impl GuardrailErrorResponse {
    /// 422 carrying the findings of a blocked pipeline run.
    pub fn blocked(result: &PipelineResult) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: GuardrailErrorBody {
                error: "blocked_by_guardrails",
                message: format!(
                    "Request blocked by content guardrails: {}",
                    result.categories().join(", ")
                ),
                findings: result.findings.iter().map(FindingSummary::from).collect(),
            },
        }
    }

    /// 500 for a pipeline execution fault.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: GuardrailErrorBody {
                error: "guardrail_error",
                message: message.into(),
                findings: Vec::new(),
            },
        }
    }

    /// 400 for a request body that cannot be buffered.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: GuardrailErrorBody {
                error: "invalid_request",
                message: message.into(),
                findings: Vec::new(),
            },
        }
    }
}

impl IntoResponse for GuardrailErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
