//! Utility helpers.

pub mod telemetry;
