//! Chart Plotter Module
//! Breakdown tables, bar charts and trend lines using egui_plot.

use behaviour_dashboard::stats::{BreakdownRow, CategoryBreakdown, DailyBreakdown};
use chrono::{Duration, NaiveDate};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points};

/// Detention charts (#007bff)
pub const DETENTION_COLOR: Color32 = Color32::from_rgb(0, 123, 255);
/// Incident type chart (#28a745)
pub const INCIDENT_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
/// Incident trend line (#dc3545)
pub const INCIDENT_TREND_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
pub const WARNING_COLOR: Color32 = Color32::from_rgb(255, 193, 7);

const CHART_HEIGHT: f32 = 300.0;

/// Creates breakdown charts and tables using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Display text for a category key; blank cells form their own group.
    pub fn category_label(key: &Option<String>) -> String {
        key.clone().unwrap_or_else(|| "(blank)".to_string())
    }

    pub fn date_label(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    pub fn format_rate(rate: Option<f64>) -> String {
        rate.map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string())
    }

    /// Bar per category, counts on the y-axis.
    pub fn draw_category_chart(
        ui: &mut egui::Ui,
        id: &str,
        rows: &CategoryBreakdown,
        x_label: &str,
        y_label: &str,
        color: Color32,
    ) {
        let labels: Vec<String> = rows.iter().map(|r| Self::category_label(&r.key)).collect();

        let bars: Vec<Bar> = rows
            .iter()
            .zip(&labels)
            .enumerate()
            .map(|(i, (row, label))| {
                Bar::new(i as f64, row.count as f64)
                    .name(Self::tooltip(label, row))
                    .fill(color)
                    .width(0.6)
            })
            .collect();

        let chart = BarChart::new(bars)
            .color(color)
            .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone()));

        Plot::new(format!("category_chart_{id}"))
            .height(CHART_HEIGHT)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(chart);
            });
    }

    /// Trend line of daily counts.
    pub fn draw_daily_chart(
        ui: &mut egui::Ui,
        id: &str,
        rows: &DailyBreakdown,
        y_label: &str,
        color: Color32,
    ) {
        let points: Vec<[f64; 2]> = rows
            .iter()
            .map(|r| [days_since_epoch(&r.key) as f64, r.count as f64])
            .collect();

        Plot::new(format!("daily_chart_{id}"))
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label(y_label)
            .x_axis_formatter(|mark, _range| {
                date_from_days(mark.value)
                    .map(|d| d.format("%d %b").to_string())
                    .unwrap_or_default()
            })
            .label_formatter(|_name, value| {
                let date = date_from_days(value.x)
                    .map(|d| Self::date_label(&d))
                    .unwrap_or_default();
                format!("{date}\n{:.0}", value.y)
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(Points::new(PlotPoints::from(points)).color(color).radius(3.0));
            });
    }

    /// Striped table of a breakdown. Attendance columns are shown when any
    /// row carries attendance data.
    pub fn draw_breakdown_table<K>(
        ui: &mut egui::Ui,
        id: &str,
        key_header: &str,
        count_header: &str,
        rows: &[BreakdownRow<K>],
        key_label: impl Fn(&K) -> String,
    ) {
        let with_attendance = rows.iter().any(|r| r.attended.is_some());

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("breakdown_table_{id}")))
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        // Headers
                        ui.label(RichText::new(key_header).strong().size(12.0));
                        ui.label(RichText::new(count_header).strong().size(12.0));
                        if with_attendance {
                            ui.label(RichText::new("Attended").strong().size(12.0));
                            ui.label(RichText::new("Attendance Rate").strong().size(12.0));
                        }
                        ui.end_row();

                        for row in rows {
                            ui.label(RichText::new(key_label(&row.key)).size(12.0));
                            ui.label(RichText::new(row.count.to_string()).size(12.0));
                            if with_attendance {
                                let attended = row
                                    .attended
                                    .map(|a| a.to_string())
                                    .unwrap_or_else(|| "-".to_string());
                                ui.label(RichText::new(attended).size(12.0));
                                ui.label(
                                    RichText::new(Self::format_rate(row.attendance_rate))
                                        .size(12.0),
                                );
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn tooltip<K>(label: &str, row: &BreakdownRow<K>) -> String {
        match row.attended {
            Some(attended) => format!(
                "{label}\nIssued: {}\nAttended: {attended}\nAttendance Rate: {}",
                row.count,
                Self::format_rate(row.attendance_rate)
            ),
            None => format!("{label}\nCount: {}", row.count),
        }
    }
}

fn days_since_epoch(date: &NaiveDate) -> i64 {
    date.signed_duration_since(NaiveDate::default()).num_days()
}

fn date_from_days(value: f64) -> Option<NaiveDate> {
    if !value.is_finite() {
        return None;
    }
    Duration::try_days(value.round() as i64)
        .and_then(|days| NaiveDate::default().checked_add_signed(days))
}
