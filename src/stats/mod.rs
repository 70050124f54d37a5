//! Stats module - summary counts and breakdowns

mod aggregator;

pub use aggregator::{
    is_present_exact, is_present_loose, ratio, BreakdownRow, CategoryBreakdown, DailyBreakdown,
    DetentionSummary, IncidentSummary, Summary, SummaryCalculator,
};
