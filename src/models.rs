//! Domain types: vitals, alerts, ingestion events and patient messages
//!
//! Vitals and alerts are immutable once the store has assigned their id and
//! timestamps. Messages are the only entity that changes after creation, and
//! only forward through [`MessageStatus`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Systolic readings strictly above this value are abnormal
pub const SYSTOLIC_UPPER_ALERT_THRESHOLD: i32 = 180;

/// Diastolic readings strictly above this value are abnormal
pub const DIASTOLIC_UPPER_ALERT_THRESHOLD: i32 = 120;

/// A single blood-pressure reading for a patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vital {
    /// Store-assigned id, `0` until stored
    pub id: u64,

    pub patient_id: String,

    pub systolic: i32,

    pub diastolic: i32,

    /// When the reading was taken (caller supplied, UTC)
    pub taken_at: DateTime<Utc>,

    /// When the store accepted the reading
    pub received_at: Option<DateTime<Utc>>,
}

impl Vital {
    /// Create an unstored vital
    pub fn new(
        patient_id: impl Into<String>,
        systolic: i32,
        diastolic: i32,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            patient_id: patient_id.into(),
            systolic,
            diastolic,
            taken_at,
            received_at: None,
        }
    }

    /// Whether the reading exceeds either alert threshold
    pub fn is_abnormal(&self) -> bool {
        self.systolic > SYSTOLIC_UPPER_ALERT_THRESHOLD
            || self.diastolic > DIASTOLIC_UPPER_ALERT_THRESHOLD
    }

    /// Human readable reason used for alerts raised by this reading
    pub fn alert_reason(&self) -> String {
        format!("abnormal blood pressure {}/{}", self.systolic, self.diastolic)
    }
}

/// Lifecycle state of an alert
///
/// Only `Active` is produced today; the other states have no transition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Resolved,
    AutoResolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::AutoResolved => "AUTO_RESOLVED",
        };
        f.write_str(name)
    }
}

/// An alert raised for an abnormal vital
///
/// The vital fields are copied, not referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Store-assigned id, `0` until stored
    pub id: u64,

    pub vital_id: u64,

    pub patient_id: String,

    pub systolic: i32,

    pub diastolic: i32,

    pub taken_at: DateTime<Utc>,

    pub received_at: Option<DateTime<Utc>>,

    pub reason: String,

    pub status: AlertStatus,

    /// Set by the store when missing
    pub created: Option<DateTime<Utc>>,
}

impl Alert {
    /// Build an active alert for the given vital
    pub fn for_vital(vital: &Vital) -> Self {
        Self {
            id: 0,
            vital_id: vital.id,
            patient_id: vital.patient_id.clone(),
            systolic: vital.systolic,
            diastolic: vital.diastolic,
            taken_at: vital.taken_at,
            received_at: vital.received_at,
            reason: vital.alert_reason(),
            status: AlertStatus::Active,
            created: Some(Utc::now()),
        }
    }
}

/// Kind tag of an ingestion event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    VitalReceived,
}

/// Transient event carried over the pubsub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub vital: Vital,
}

impl Event {
    pub fn vital_received(vital: Vital) -> Self {
        Self {
            kind: EventKind::VitalReceived,
            vital,
        }
    }
}

/// Delivery state of a patient message
///
/// Ordered: `Queued < Processing < Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Queued,
    Processing,
    Sent,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageStatus::Queued => "QUEUED",
            MessageStatus::Processing => "PROCESSING",
            MessageStatus::Sent => "SENT",
        };
        f.write_str(name)
    }
}

/// An outbound patient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,

    pub patient_id: String,

    pub content: String,

    pub status: MessageStatus,

    pub queued_at: DateTime<Utc>,

    /// Only set once the message reaches [`MessageStatus::Sent`]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Move the message forward to `status`
    ///
    /// Returns `false` (leaving the message untouched) when `status` is not
    /// strictly after the current one.
    pub fn advance(&mut self, status: MessageStatus, now: DateTime<Utc>) -> bool {
        if status <= self.status {
            return false;
        }

        self.status = status;
        if status == MessageStatus::Sent {
            self.sent_at = Some(now);
        }
        true
    }
}
