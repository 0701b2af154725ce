use crate::core::orchestrator::{Outcome, RequestOrchestrator};
use crate::domain::model::{ErrorSet, Field, FieldRule, InputRecord};
use crate::web::views;
use crate::web::AppState;
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn index() -> Html<String> {
    Html(views::render_form(None, &BTreeMap::new()))
}

/// Form pairs in submission order; a repeated key keeps its first value.
pub fn form_to_input(pairs: Vec<(String, String)>) -> InputRecord {
    let mut values = BTreeMap::new();
    for (key, value) in pairs {
        values.entry(key).or_insert(value);
    }
    values.into_iter().collect()
}

/// HTML form submission. Always answers 200, like a classic form post.
/// A body that is not form-encoded is treated as an empty submission.
pub async fn predict_form(
    State(state): State<AppState>,
    form: std::result::Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Html<String> {
    let pairs = match form {
        Ok(Form(pairs)) => pairs,
        Err(rejection) => {
            tracing::warn!("⚠️ Unreadable form body, treating as empty: {}", rejection);
            Vec::new()
        }
    };
    let report = RequestOrchestrator::new(state.predictor.clone())
        .handle(form_to_input(pairs))
        .await;

    let html = match &report.outcome {
        Outcome::Succeeded { prediction, inputs } => views::render_result(prediction, inputs),
        Outcome::Invalid { errors, inputs } | Outcome::Failed { errors, inputs } => {
            views::render_form(Some(errors), inputs)
        }
    };
    Html(html)
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse {
    Succeeded {
        label: u8,
        result: &'static str,
        proba: Option<f64>,
        inputs: BTreeMap<String, String>,
        predicted_at: DateTime<Utc>,
    },
    Invalid {
        errors: ErrorSet,
        inputs: BTreeMap<String, String>,
    },
    Failed {
        errors: ErrorSet,
        inputs: BTreeMap<String, String>,
    },
}

impl From<Outcome> for ApiResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded { prediction, inputs } => ApiResponse::Succeeded {
                label: prediction.label.code(),
                result: prediction.label.text(),
                proba: prediction.probability,
                inputs,
                predicted_at: Utc::now(),
            },
            Outcome::Invalid { errors, inputs } => ApiResponse::Invalid { errors, inputs },
            Outcome::Failed { errors, inputs } => ApiResponse::Failed { errors, inputs },
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiResponse::Succeeded { .. } => StatusCode::OK,
            ApiResponse::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiResponse::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// JSON values become the strings a form would have sent; `null` counts as missing.
pub fn json_to_input(body: serde_json::Map<String, serde_json::Value>) -> InputRecord {
    body.into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

pub async fn predict_json(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> ApiResponse {
    let report = RequestOrchestrator::new(state.predictor.clone())
        .handle(json_to_input(body))
        .await;
    report.outcome.into()
}

#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub rule: FieldRule,
}

pub async fn fields() -> Json<Vec<FieldInfo>> {
    Json(
        Field::ALL
            .into_iter()
            .map(|field| FieldInfo {
                name: field.name(),
                label: field.label(),
                rule: field.rule(),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    version: &'static str,
    model: String,
}

pub async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready",
        version: VERSION,
        model: state.predictor.model_name().to_string(),
    })
}
