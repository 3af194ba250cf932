//! qwalert library
//!
//! Weather hazard alerts for a location with a last-known-alert fallback, so a
//! transient upstream outage never reads as an "all clear".

pub mod alerts;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod service;
