//! Store trait definition

use crate::error::Result;
use crate::models::{Alert, Vital};

/// Repository of vitals and alerts
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; they are shared between request
/// handlers and the alert worker.
///
/// ## Closing
///
/// After [`Store::close`] every operation, reads included, fails with
/// [`Error::StoreClosed`](crate::error::Error::StoreClosed).
pub trait Store: Send + Sync {
    /// Store a vital, assigning its id and `received_at` when unset
    ///
    /// Returns the stored copy.
    fn add_vital(&self, vital: Vital) -> Result<Vital>;

    /// Store an alert, assigning its id and `created` when unset
    fn add_alert(&self, alert: Alert) -> Result<Alert>;

    /// Snapshot of all vitals in insertion order
    fn list_vitals(&self) -> Result<Vec<Vital>>;

    /// Snapshot of all alerts in insertion order
    fn list_alerts(&self) -> Result<Vec<Alert>>;

    /// Discard all data and reject further access
    fn close(&self) -> Result<()>;
}
