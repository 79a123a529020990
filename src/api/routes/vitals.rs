//! Vital ingestion and listing endpoints

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use chrono::DateTime;
use tracing::instrument;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{IngestVitalRequest, PatientQuery, VitalBody, VitalResponse, VitalsResponse},
};

/// POST /vitals
///
/// Validate, store and publish a reading. `taken_at` is unix seconds and
/// must be positive.
#[instrument(skip_all)]
pub async fn ingest_vital(
    State(state): State<ApiState>,
    body: Result<Json<IngestVitalRequest>, JsonRejection>,
) -> ApiResult<Json<VitalResponse>> {
    let Json(request) = body?;

    let taken_at = (request.taken_at > 0)
        .then(|| DateTime::from_timestamp(request.taken_at, 0))
        .flatten()
        .ok_or_else(|| ApiError::InvalidRequest("taken_at is required".to_string()))?;

    let vital = state
        .service
        .ingest_vital(
            &request.patient_id,
            request.systolic,
            request.diastolic,
            Some(taken_at),
        )
        .await?;

    Ok(Json(VitalResponse {
        vital: VitalBody::from(&vital),
    }))
}

/// GET /vitals?patient_id=
pub async fn list_vitals(
    State(state): State<ApiState>,
    Query(query): Query<PatientQuery>,
) -> ApiResult<Json<VitalsResponse>> {
    let vitals = state.service.list_vitals(query.patient_id.as_deref())?;

    Ok(Json(VitalsResponse {
        vitals: vitals.iter().map(VitalBody::from).collect(),
    }))
}
