//! Library half of the `rampatch` CLI: configuration loading and run reports.

pub mod config;
pub mod report;
