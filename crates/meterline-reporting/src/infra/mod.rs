//! Infrastructure - capabilities consumed by the reporting pipeline

pub mod analytics;
pub mod bootstrap;
pub mod memory_client;
pub mod metering;
