//! Shared API wire types
//!
//! Used by the HTTP handlers to serialize responses and by the CLI client to
//! deserialize them, so the two never drift apart. Timestamps on the wire are
//! unix seconds; a missing timestamp is encoded as `0`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Alert, AlertStatus, Message, MessageStatus, Vital};

fn unix(timestamp: Option<DateTime<Utc>>) -> i64 {
    timestamp.map_or(0, |t| t.timestamp())
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalBody {
    pub id: u64,
    pub patient_id: String,
    pub systolic: i32,
    pub diastolic: i32,
    pub taken_at: i64,
    pub received_at: i64,
}

impl From<&Vital> for VitalBody {
    fn from(vital: &Vital) -> Self {
        Self {
            id: vital.id,
            patient_id: vital.patient_id.clone(),
            systolic: vital.systolic,
            diastolic: vital.diastolic,
            taken_at: vital.taken_at.timestamp(),
            received_at: unix(vital.received_at),
        }
    }
}

/// An alert with its originating reading nested under `vital`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertBody {
    pub id: u64,
    pub vital: VitalBody,
    pub reason: String,
    pub created_at: i64,
    pub status: AlertStatus,
}

impl From<&Alert> for AlertBody {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            vital: VitalBody {
                id: alert.vital_id,
                patient_id: alert.patient_id.clone(),
                systolic: alert.systolic,
                diastolic: alert.diastolic,
                taken_at: alert.taken_at.timestamp(),
                received_at: unix(alert.received_at),
            },
            reason: alert.reason.clone(),
            created_at: unix(alert.created),
            status: alert.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub id: u64,
    pub patient_id: String,
    pub content: String,
    pub status: MessageStatus,
    pub queued_at: i64,
    /// `0` until the message is sent
    pub sent_at: i64,
}

impl From<&Message> for MessageBody {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            patient_id: message.patient_id.clone(),
            content: message.content.clone(),
            status: message.status,
            queued_at: message.queued_at.timestamp(),
            sent_at: unix(message.sent_at),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /vitals`
///
/// Missing numeric fields default to `0` and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestVitalRequest {
    pub patient_id: String,
    pub systolic: i32,
    pub diastolic: i32,
    /// Unix seconds, required
    pub taken_at: i64,
}

/// Body of `POST /messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnqueueMessageRequest {
    pub patient_id: String,
    pub content: String,
}

/// `?patient_id=` filter on list endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientQuery {
    pub patient_id: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalResponse {
    pub vital: VitalBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsResponse {
    pub vitals: Vec<VitalBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: MessageBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Frames pushed over `GET /events`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Connected,
    MessageUpdate { message: MessageBody },
}
