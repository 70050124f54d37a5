//! Charts module - Breakdown charts and tables

mod plotter;

pub use plotter::{
    ChartPlotter, DETENTION_COLOR, INCIDENT_COLOR, INCIDENT_TREND_COLOR, WARNING_COLOR,
};
