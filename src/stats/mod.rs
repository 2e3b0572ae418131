//! Server and session statistics

pub mod metrics;

pub use metrics::{ServerStats, SessionStats, StatsSnapshot};
