//! Alert listing endpoint

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{AlertBody, AlertsResponse, PatientQuery},
};

/// GET /alerts?patient_id=
pub async fn list_alerts(
    State(state): State<ApiState>,
    Query(query): Query<PatientQuery>,
) -> ApiResult<Json<AlertsResponse>> {
    let alerts = state.service.list_alerts(query.patient_id.as_deref())?;

    Ok(Json(AlertsResponse {
        alerts: alerts.iter().map(AlertBody::from).collect(),
    }))
}
