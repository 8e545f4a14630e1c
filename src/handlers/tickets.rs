use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(alias = "participantId")]
    pub participant_id: Option<Value>,
}

/// Scanners send the id as a number or as the raw QR text.
fn parse_participant_id(value: Option<Value>) -> Result<i64, AppError> {
    let invalid = || AppError::ValidationError("participant_id must be a numeric id".to_string());

    match value {
        None | Some(Value::Null) => Err(AppError::ValidationError(
            "participant_id is required".to_string(),
        )),
        Some(Value::Number(number)) => number.as_i64().ok_or_else(invalid),
        Some(Value::String(text)) if text.trim().is_empty() => Err(AppError::ValidationError(
            "participant_id is required".to_string(),
        )),
        Some(Value::String(text)) => text.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

pub async fn get_ticket(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let ticket = state.tickets.get_ticket(id).await?;
    Ok(success(ticket, "Ticket retrieved"))
}

pub async fn scan_ticket(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let participant_id = parse_participant_id(payload.participant_id)?;

    let result = state.tickets.scan(participant_id).await?;

    Ok(success(result, "Ticket validated"))
}
