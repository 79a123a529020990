//! HTTP client for the vitals API, used by the CLI

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::api::types::{
    AlertBody, AlertsResponse, ErrorResponse, IngestVitalRequest, MessageBody, MessagesResponse,
    VitalBody, VitalResponse, VitalsResponse,
};

/// Request timeout for every call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `addr` (`host:port` or a full `http(s)://` URL)
    pub fn new(addr: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url(addr),
        })
    }

    pub async fn insert_vital(&self, request: &IngestVitalRequest) -> Result<VitalBody> {
        let response = self
            .client
            .post(format!("{}/vitals", self.base_url))
            .json(request)
            .send()
            .await?;

        Ok(parse::<VitalResponse>(response).await?.vital)
    }

    pub async fn list_vitals(&self, patient_id: Option<&str>) -> Result<Vec<VitalBody>> {
        let response = self.get("/vitals", patient_id).await?;
        Ok(parse::<VitalsResponse>(response).await?.vitals)
    }

    pub async fn list_alerts(&self, patient_id: Option<&str>) -> Result<Vec<AlertBody>> {
        let response = self.get("/alerts", patient_id).await?;
        Ok(parse::<AlertsResponse>(response).await?.alerts)
    }

    pub async fn list_messages(&self) -> Result<Vec<MessageBody>> {
        let response = self.get("/messages", None).await?;
        Ok(parse::<MessagesResponse>(response).await?.messages)
    }

    async fn get(&self, path: &str, patient_id: Option<&str>) -> Result<Response> {
        let mut request = self.client.get(format!("{}{path}", self.base_url));
        if let Some(patient_id) = patient_id.filter(|p| !p.is_empty()) {
            request = request.query(&[("patient_id", patient_id)]);
        }

        trace!("GET {}{path}", self.base_url);
        Ok(request.send().await?)
    }
}

/// Decode a success body, or turn an error response into its message
async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("status {}", status.as_u16()),
        };
        bail!(message);
    }

    response
        .json::<T>()
        .await
        .context("failed to decode response body")
}

fn base_url(addr: &str) -> String {
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.trim_end_matches('/').to_string()
    } else {
        format!("http://{addr}")
    }
}

// ============================================================================
// Output formatting
// ============================================================================

pub fn format_stored_vital(vital: &VitalBody) -> String {
    format!(
        "stored vital id={} patient={} bp={}/{} taken_at={} received_at={}",
        vital.id, vital.patient_id, vital.systolic, vital.diastolic, vital.taken_at, vital.received_at
    )
}

pub fn format_vital(vital: &VitalBody) -> String {
    format!(
        "vital id={} patient={} bp={}/{} taken_at={} received_at={}",
        vital.id, vital.patient_id, vital.systolic, vital.diastolic, vital.taken_at, vital.received_at
    )
}

pub fn format_alert(alert: &AlertBody) -> String {
    format!(
        "alert id={} patient={} bp={}/{} status={} reason={} created_at={}",
        alert.id,
        alert.vital.patient_id,
        alert.vital.systolic,
        alert.vital.diastolic,
        alert.status,
        alert.reason,
        alert.created_at
    )
}

pub fn format_message(message: &MessageBody) -> String {
    format!(
        "message id={} patient={} status={} content={} queued_at={} sent_at={}",
        message.id,
        message.patient_id,
        message.status,
        message.content,
        message.queued_at,
        message.sent_at
    )
}
