//! Near-Earth object tracking: risk scoring over the NeoWs feed, per-user
//! watchlists, and deduplicated close-approach notifications.

pub mod alerts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
