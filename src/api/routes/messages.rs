//! Patient message endpoints

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{EnqueueMessageRequest, MessageBody, MessageResponse, MessagesResponse},
};

/// GET /messages
///
/// Every message ever queued, with its current status
pub async fn list_messages(State(state): State<ApiState>) -> Json<MessagesResponse> {
    let messages = state.messages.list_messages();

    Json(MessagesResponse {
        messages: messages.iter().map(MessageBody::from).collect(),
    })
}

/// POST /messages
///
/// Queue a message for simulated delivery
#[instrument(skip_all)]
pub async fn enqueue_message(
    State(state): State<ApiState>,
    body: Result<Json<EnqueueMessageRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = body?;

    let patient_id = request.patient_id.trim();
    if patient_id.is_empty() {
        return Err(ApiError::InvalidRequest("patient_id is required".to_string()));
    }

    let message = state.messages.enqueue(patient_id, request.content);

    Ok(Json(MessageResponse {
        message: MessageBody::from(&message),
    }))
}
