//! Ingestion service: validates vitals, stores them and publishes events

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::models::{Alert, Event, Vital};
use crate::pubsub::Publisher;
use crate::storage::Store;

/// Glue between the API layer and the core
#[derive(Clone)]
pub struct VitalService {
    store: Arc<dyn Store>,
    publisher: Arc<dyn Publisher>,
}

impl VitalService {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn Publisher>) -> Self {
        Self { store, publisher }
    }

    /// Validate, store and publish a vital
    ///
    /// The patient id is trimmed and `taken_at` is normalized to UTC. The
    /// vital is stored before it is published, so a publish failure still
    /// leaves it in the store.
    #[instrument(skip(self, taken_at))]
    pub async fn ingest_vital<Tz: TimeZone>(
        &self,
        patient_id: &str,
        systolic: i32,
        diastolic: i32,
        taken_at: Option<DateTime<Tz>>,
    ) -> Result<Vital> {
        let vital = validate(patient_id, systolic, diastolic, taken_at)?;
        let stored = self.store.add_vital(vital)?;
        debug!("stored vital {}", stored.id);

        self.publisher
            .publish(Event::vital_received(stored.clone()))
            .await?;

        Ok(stored)
    }

    /// Vitals in insertion order, optionally restricted to one patient
    pub fn list_vitals(&self, patient_id: Option<&str>) -> Result<Vec<Vital>> {
        let vitals = self.store.list_vitals()?;
        Ok(match patient_filter(patient_id) {
            Some(patient) => vitals.into_iter().filter(|v| v.patient_id == patient).collect(),
            None => vitals,
        })
    }

    /// Alerts in insertion order, optionally restricted to one patient
    pub fn list_alerts(&self, patient_id: Option<&str>) -> Result<Vec<Alert>> {
        let alerts = self.store.list_alerts()?;
        Ok(match patient_filter(patient_id) {
            Some(patient) => alerts.into_iter().filter(|a| a.patient_id == patient).collect(),
            None => alerts,
        })
    }
}

/// Blank filters mean "all patients"
fn patient_filter(patient_id: Option<&str>) -> Option<&str> {
    patient_id.map(str::trim).filter(|p| !p.is_empty())
}

fn validate<Tz: TimeZone>(
    patient_id: &str,
    systolic: i32,
    diastolic: i32,
    taken_at: Option<DateTime<Tz>>,
) -> Result<Vital> {
    let patient_id = patient_id.trim();
    if patient_id.is_empty() {
        return Err(Error::InvalidVital("patient_id is required".to_string()));
    }
    if systolic <= 0 || diastolic <= 0 {
        return Err(Error::InvalidVital(
            "systolic and diastolic must be positive".to_string(),
        ));
    }
    let Some(taken_at) = taken_at else {
        return Err(Error::InvalidVital("taken_at is required".to_string()));
    };

    Ok(Vital::new(
        patient_id,
        systolic,
        diastolic,
        taken_at.with_timezone(&Utc),
    ))
}
