//! Core data model for usage reporting

pub mod metering_config;
pub mod usage_report;
pub mod usage_window;
