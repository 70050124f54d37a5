//! Behaviour Dashboard - detention and on-call incident monitoring
//!
//! Loads detention and on-call logs exported from a school MIS, normalizes
//! their columns and computes the attendance and incident summaries shown in
//! the dashboard.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::{DashboardConfig, DateOrder};
pub use data::{DatasetKind, Issue, LoaderError, Source};
pub use pipeline::load_and_summarize;
pub use stats::Summary;
