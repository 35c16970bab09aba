//! Reporting domain
//!
//! Collection turns dimension names into [`UsageReport`](meterline_common::UsageReport)s;
//! reporting submits them one by one to the metering provider.

pub mod catalog;
pub mod collector;
pub mod pipeline;
pub mod reporter;
