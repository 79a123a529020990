//! Blood-pressure vitals ingestion and alerting
//!
//! Readings are stored and published through a [`pubsub::PubSub`]; an
//! [`actors::AlertWorker`] turns abnormal readings into alerts and queues a
//! patient message, and an [`actors::MessageWorker`] drains the
//! [`queue::MessageQueue`] with a simulated delivery delay.

pub mod actors;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pubsub;
pub mod queue;
pub mod service;
pub mod storage;

pub use error::{Error, Result};
pub use models::{Alert, AlertStatus, Event, EventKind, Message, MessageStatus, Vital};
pub use pubsub::{PubSub, Publisher, Subscription};
pub use queue::{DelayRange, MessageQueue};
pub use service::VitalService;
