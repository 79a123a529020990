//! In-memory storage backend (no persistence)
//!
//! A single mutex guards the closed flag and both collections. Contention is
//! a handful of request handlers plus the alert worker, so one lock is enough.
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart or close
//! - **Unbounded**: Vitals and alerts are never evicted

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, trace};

use super::backend::Store;
use crate::error::{Error, Result};
use crate::models::{Alert, Vital};

#[derive(Debug, Default)]
struct Inner {
    closed: bool,
    vital_seq: u64,
    alert_seq: u64,
    vitals: Vec<Vital>,
    alerts: Vec<Alert>,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create a new, open, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state, failing if the store has been closed
    fn open(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Err(Error::StoreClosed);
        }
        Ok(inner)
    }
}

impl Store for MemoryStore {
    fn add_vital(&self, mut vital: Vital) -> Result<Vital> {
        let mut inner = self.open()?;

        if vital.id == 0 {
            inner.vital_seq += 1;
            vital.id = inner.vital_seq;
        }
        if vital.received_at.is_none() {
            vital.received_at = Some(Utc::now());
        }

        trace!("stored vital {} for {}", vital.id, vital.patient_id);
        inner.vitals.push(vital.clone());
        Ok(vital)
    }

    fn add_alert(&self, mut alert: Alert) -> Result<Alert> {
        let mut inner = self.open()?;

        if alert.id == 0 {
            inner.alert_seq += 1;
            alert.id = inner.alert_seq;
        }
        if alert.created.is_none() {
            alert.created = Some(Utc::now());
        }

        trace!("stored alert {} for {}", alert.id, alert.patient_id);
        inner.alerts.push(alert.clone());
        Ok(alert)
    }

    fn list_vitals(&self) -> Result<Vec<Vital>> {
        Ok(self.open()?.vitals.clone())
    }

    fn list_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.open()?.alerts.clone())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.open()?;
        debug!(
            "closing in-memory store ({} vitals, {} alerts discarded)",
            inner.vitals.len(),
            inner.alerts.len()
        );

        inner.closed = true;
        inner.vitals = Vec::new();
        inner.alerts = Vec::new();
        Ok(())
    }
}
