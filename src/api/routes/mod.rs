//! HTTP route handlers

pub mod alerts;
pub mod dashboard;
pub mod health;
pub mod messages;
pub mod vitals;
