//! Compliance status engine for grant and funding management.
//!
//! The crate exposes the tracking/document/recurring data model, the status
//! classifier and score calculator, alert synchronization, and an axum router
//! serving `/api/compliance` over any [`compliance::ComplianceStore`].

pub mod compliance;
pub mod config;
pub mod error;
pub mod telemetry;
