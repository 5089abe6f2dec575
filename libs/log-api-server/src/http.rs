use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use logcast_api::LogSubmission;
use logcast_engine::{LogError, QueryParams};

use super::AppState;

fn error_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  REST: POST /api/logs
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_submit_log(
    State(state): State<AppState>,
    payload: Result<Json<LogSubmission>, JsonRejection>,
) -> Response {
    let Json(submission) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected log submission body");
            return error_response(StatusCode::BAD_REQUEST, json!({ "error": rejection.body_text() }));
        }
    };

    match state.engine.ingestor.ingest(submission).await {
        Ok(record) => Json(json!({ "success": true, "id": record.id })).into_response(),
        Err(LogError::Validation(missing)) => error_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Missing required fields", "missing": missing }),
        ),
        // Ingestion does not produce filter errors; treat like a store failure.
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to save log" }),
        ),
    }
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /api/logs?type=&service=&from=&to=
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_query_logs(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, json!({ "error": rejection.body_text() }));
        }
    };

    match state.engine.queries.query(params).await {
        Ok(records) => Json(records).into_response(),
        Err(LogError::InvalidFilter(_)) => error_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "From date cannot be after To date" }),
        ),
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to fetch logs" }),
        ),
    }
}
