//! Background workers
//!
//! Each worker runs as an independent Tokio task and stops when the shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken) is cancelled.
//!
//! ## Architecture Overview
//!
//! ```text
//!   POST /vitals ──▶ VitalService ──▶ Store.add_vital
//!                          │
//!                          ▼ publish (bounded, single subscriber)
//!                     ┌─────────┐
//!                     │ PubSub  │
//!                     └────┬────┘
//!                          ▼
//!                    AlertWorker ──▶ Store.add_alert
//!                          │
//!                          ▼ enqueue
//!                   ┌──────────────┐  listeners   ┌───────────┐
//!                   │ MessageQueue │─────────────▶│ dashboard │
//!                   └──────┬───────┘              └───────────┘
//!                          ▼
//!                    MessageWorker (QUEUED → PROCESSING → SENT)
//! ```
//!
//! ## Worker Types
//!
//! - **AlertWorker**: Sole pubsub subscriber, raises alerts for abnormal vitals
//! - **MessageWorker**: Simulates delayed delivery of patient notifications

pub mod alert;
pub mod message;

pub use alert::AlertWorker;
pub use message::MessageWorker;
