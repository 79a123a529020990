//! Storage for vitals and alerts
//!
//! The [`Store`] trait is the capability consumed by the ingestion service,
//! the alert worker and the API. [`MemoryStore`] is the only backend: data
//! lives for the lifetime of the process and is discarded on [`Store::close`].
//!
//! ## Usage
//!
//! ```
//! use chrono::Utc;
//! use vitals_monitor::models::Vital;
//! use vitals_monitor::storage::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let stored = store.add_vital(Vital::new("patient-1", 120, 80, Utc::now())).unwrap();
//! assert_eq!(stored.id, 1);
//! ```

pub mod backend;
pub mod memory;

pub use backend::Store;
pub use memory::MemoryStore;
