//! Dashboard View Widget
//! Central scrollable panel with headline metrics, breakdowns and trend charts.

use crate::charts::{
    ChartPlotter, DETENTION_COLOR, INCIDENT_COLOR, INCIDENT_TREND_COLOR, WARNING_COLOR,
};
use behaviour_dashboard::data::columns::{DATE_TIME, ISSUED_DATE, TYPE, YEAR};
use behaviour_dashboard::data::reports_missing;
use behaviour_dashboard::stats::{DetentionSummary, IncidentSummary};
use behaviour_dashboard::{DatasetKind, Issue, Summary};
use egui::{CollapsingHeader, Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;
const METRIC_WIDTH: f32 = 180.0;

/// Latest summary for each dataset.
#[derive(Default)]
pub struct DashboardView {
    pub detentions: Option<Summary>,
    pub incidents: Option<Summary>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_summary(&mut self, summary: Summary) {
        match summary.kind() {
            DatasetKind::Detentions => self.detentions = Some(summary),
            DatasetKind::Incidents => self.incidents = Some(summary),
        }
    }

    pub fn clear(&mut self, kind: DatasetKind) {
        match kind {
            DatasetKind::Detentions => self.detentions = None,
            DatasetKind::Incidents => self.incidents = None,
        }
    }

    /// Draw the dashboards
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading(RichText::new("School Behaviour Monitoring Dashboard").size(24.0));
        ui.add_space(4.0);
        ui.label(
            RichText::new(
                "Upload your detentions and on-call data or provide a Google Sheets link. \
                 Attendance rates, breakdowns and trend charts are calculated automatically.",
            )
            .color(Color32::GRAY),
        );
        ui.add_space(SECTION_SPACING);

        if self.detentions.is_none() && self.incidents.is_none() {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new(
                        "Please upload data files or provide Google Sheets links to see the dashboards.",
                    )
                    .size(16.0),
                );
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if let Some(Summary::Detentions(summary)) = &self.detentions {
                    Self::draw_detentions(ui, summary);
                    ui.add_space(SECTION_SPACING);
                    ui.separator();
                    ui.add_space(SECTION_SPACING);
                }
                if let Some(Summary::Incidents(summary)) = &self.incidents {
                    Self::draw_incidents(ui, summary);
                }
            });
    }

    fn draw_detentions(ui: &mut egui::Ui, summary: &DetentionSummary) {
        ui.heading("Detentions Dashboard");
        ui.add_space(8.0);

        if summary.total == 0 {
            ui.label("No detentions data available.");
            return;
        }

        ui.horizontal(|ui| {
            Self::metric(ui, "Total Detentions", summary.total.to_string());
            Self::metric(ui, "Attended", summary.attended.to_string());
            Self::metric(
                ui,
                "Attendance Rate",
                ChartPlotter::format_rate(Some(summary.attendance_rate)),
            );
        });
        ui.add_space(8.0);
        Self::draw_issues(ui, &summary.issues);

        CollapsingHeader::new("Year Group Breakdown")
            .id_salt("detentions_year")
            .default_open(true)
            .show(ui, |ui| {
                if summary.by_year.is_empty() {
                    Self::warn_missing(ui, YEAR, "detentions", &summary.issues);
                    return;
                }
                ChartPlotter::draw_breakdown_table(
                    ui,
                    "detentions_year",
                    "Year",
                    "Issued",
                    &summary.by_year,
                    ChartPlotter::category_label,
                );
                ui.add_space(8.0);
                ChartPlotter::draw_category_chart(
                    ui,
                    "detentions_year",
                    &summary.by_year,
                    "Year Group",
                    "Issued Count",
                    DETENTION_COLOR,
                );
            });

        CollapsingHeader::new("Daily Monitoring")
            .id_salt("detentions_daily")
            .default_open(true)
            .show(ui, |ui| {
                if summary.by_day.is_empty() {
                    Self::warn_missing(ui, ISSUED_DATE, "detentions", &summary.issues);
                    return;
                }
                ChartPlotter::draw_breakdown_table(
                    ui,
                    "detentions_daily",
                    "Date",
                    "Issued",
                    &summary.by_day,
                    ChartPlotter::date_label,
                );
                ui.add_space(8.0);
                ChartPlotter::draw_daily_chart(
                    ui,
                    "detentions_daily",
                    &summary.by_day,
                    "Detentions Issued",
                    DETENTION_COLOR,
                );
            });
    }

    fn draw_incidents(ui: &mut egui::Ui, summary: &IncidentSummary) {
        ui.heading("On-Call Dashboard");
        ui.add_space(8.0);

        if summary.total == 0 {
            ui.label("No on-call data available.");
            return;
        }

        ui.horizontal(|ui| {
            Self::metric(ui, "Total Incidents", summary.total.to_string());
            Self::metric(ui, "Resolved", summary.resolved.to_string());
            Self::metric(ui, "Unresolved", summary.unresolved.to_string());
        });
        ui.add_space(8.0);
        Self::draw_issues(ui, &summary.issues);

        CollapsingHeader::new("Incident Type Breakdown")
            .id_salt("incidents_type")
            .default_open(true)
            .show(ui, |ui| {
                if summary.by_type.is_empty() {
                    Self::warn_missing(ui, TYPE, "on-call", &summary.issues);
                    return;
                }
                ChartPlotter::draw_breakdown_table(
                    ui,
                    "incidents_type",
                    "Type",
                    "Count",
                    &summary.by_type,
                    ChartPlotter::category_label,
                );
                ui.add_space(8.0);
                ChartPlotter::draw_category_chart(
                    ui,
                    "incidents_type",
                    &summary.by_type,
                    "Incident Type",
                    "Count",
                    INCIDENT_COLOR,
                );
            });

        CollapsingHeader::new("Daily Monitoring")
            .id_salt("incidents_daily")
            .default_open(true)
            .show(ui, |ui| {
                if summary.by_day.is_empty() {
                    Self::warn_missing(ui, DATE_TIME, "on-call", &summary.issues);
                    return;
                }
                ChartPlotter::draw_breakdown_table(
                    ui,
                    "incidents_daily",
                    "Date",
                    "Incidents",
                    &summary.by_day,
                    ChartPlotter::date_label,
                );
                ui.add_space(8.0);
                ChartPlotter::draw_daily_chart(
                    ui,
                    "incidents_daily",
                    &summary.by_day,
                    "On-Call Incidents",
                    INCIDENT_TREND_COLOR,
                );
            });
    }

    fn metric(ui: &mut egui::Ui, label: &str, value: String) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(METRIC_WIDTH);
                ui.vertical(|ui| {
                    ui.label(RichText::new(label).size(12.0).color(Color32::GRAY));
                    ui.label(RichText::new(value).size(26.0).strong());
                });
            });
    }

    /// Soft warnings other than missing columns, which each section reports.
    fn draw_issues(ui: &mut egui::Ui, issues: &[Issue]) {
        for issue in issues {
            if matches!(issue, Issue::MissingColumn { .. }) {
                continue;
            }
            ui.label(RichText::new(format!("⚠ {issue}")).size(12.0).color(WARNING_COLOR));
        }
    }

    fn warn_missing(ui: &mut egui::Ui, column: &str, dataset: &str, issues: &[Issue]) {
        let text = if reports_missing(issues, column) {
            format!("The '{column}' column is missing from {dataset} data.")
        } else {
            format!("No rows with a usable '{column}' value.")
        };
        ui.label(RichText::new(format!("⚠ {text}")).color(WARNING_COLOR));
    }
}
