//! Control Panel Widget
//! Left side panel with a file picker and link field for each dataset.

use behaviour_dashboard::DatasetKind;
use egui::{Color32, RichText};
use std::path::PathBuf;

/// Input state for one dataset.
pub struct DatasetInput {
    pub kind: DatasetKind,
    pub file_path: Option<PathBuf>,
    pub url: String,
    pub status: String,
    pub is_loading: bool,
    pub has_data: bool,
}

impl DatasetInput {
    pub fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            file_path: None,
            url: String::new(),
            status: "No data loaded".to_string(),
            is_loading: false,
            has_data: false,
        }
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Left side control panel with per-dataset sources and export.
pub struct ControlPanel {
    pub detentions: DatasetInput,
    pub incidents: DatasetInput,
    pub export_status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            detentions: DatasetInput::new(DatasetKind::Detentions),
            incidents: DatasetInput::new(DatasetKind::Incidents),
            export_status: String::new(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self, kind: DatasetKind) -> &DatasetInput {
        match kind {
            DatasetKind::Detentions => &self.detentions,
            DatasetKind::Incidents => &self.incidents,
        }
    }

    pub fn input_mut(&mut self, kind: DatasetKind) -> &mut DatasetInput {
        match kind {
            DatasetKind::Detentions => &mut self.detentions,
            DatasetKind::Incidents => &mut self.incidents,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🏫 Behaviour Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Detentions & On-Call")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        for input in [&mut self.detentions, &mut self.incidents] {
            if let Some(a) = Self::show_dataset(ui, input) {
                action = a;
            }
            ui.add_space(10.0);
            ui.separator();
            ui.add_space(5.0);
        }

        // ===== Export =====
        ui.vertical_centered(|ui| {
            let export_enabled = self.detentions.has_data || self.incidents.has_data;
            ui.add_enabled_ui(export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("💾 Export Summary").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportSummary;
                }
            });

            if !self.export_status.is_empty() {
                ui.add_space(5.0);
                ui.label(
                    RichText::new(&self.export_status)
                        .size(11.0)
                        .color(status_color(&self.export_status)),
                );
            }
        });

        action
    }

    fn show_dataset(ui: &mut egui::Ui, input: &mut DatasetInput) -> Option<ControlPanelAction> {
        let mut action = None;
        let kind = input.kind;

        ui.label(
            RichText::new(format!("📁 {} Data", kind.label()))
                .size(14.0)
                .strong(),
        );
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.add_enabled_ui(!input.is_loading, |ui| {
                    // File upload
                    ui.horizontal(|ui| {
                        let path_text = input
                            .file_path
                            .as_ref()
                            .and_then(|p| p.file_name())
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| "Excel or CSV file".to_string());

                        ui.label(RichText::new(&path_text).size(12.0).color(
                            if input.file_path.is_some() {
                                ui.visuals().strong_text_color()
                            } else {
                                Color32::GRAY
                            },
                        ));

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = Some(ControlPanelAction::BrowseFile(kind));
                            }
                        });
                    });

                    ui.add_space(5.0);

                    // Live link
                    ui.label(RichText::new("Or load from a link").size(11.0).color(Color32::GRAY));
                    ui.horizontal(|ui| {
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut input.url)
                                .hint_text("https://...")
                                .desired_width(200.0),
                        );
                        let submitted = response.lost_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if ui.button("Load").clicked() || submitted {
                            action = Some(ControlPanelAction::LoadUrl(kind));
                        }
                    });
                });

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if input.is_loading {
                        ui.spinner();
                    }
                    ui.label(
                        RichText::new(&input.status)
                            .size(11.0)
                            .color(status_color(&input.status)),
                    );
                    if input.has_data && !input.is_loading {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("Clear").clicked() {
                                action = Some(ControlPanelAction::Clear(kind));
                            }
                        });
                    }
                });
            });

        action
    }
}

fn status_color(status: &str) -> Color32 {
    if status.starts_with("Error") || status.starts_with("Unsupported") {
        Color32::from_rgb(220, 53, 69)
    } else if status.starts_with("Loaded") || status.starts_with("Exported") {
        Color32::from_rgb(40, 167, 69)
    } else {
        Color32::GRAY
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFile(DatasetKind),
    LoadUrl(DatasetKind),
    Clear(DatasetKind),
    ExportSummary,
}
