//! Behaviour Dashboard Main Application
//! Main window with control panel and dashboard view.

use crate::gui::{ControlPanel, ControlPanelAction, DashboardView};
use anyhow::{Context, Result};
use behaviour_dashboard::{load_and_summarize, DashboardConfig, DatasetKind, Source, Summary};
use egui::SidePanel;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info};

/// Load result from background thread
enum LoadResult {
    Complete(Summary),
    Error(String),
}

/// Where a load request reads from; files are read on the worker thread.
enum Request {
    File(PathBuf),
    Url(String),
}

/// JSON document written by "Export Summary".
#[derive(Serialize)]
struct SummaryExport<'a> {
    detentions: Option<&'a Summary>,
    incidents: Option<&'a Summary>,
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    control_panel: ControlPanel,
    dashboard: DashboardView,

    // One in-flight load per dataset; replacing the receiver drops stale results
    load_rx: HashMap<DatasetKind, Receiver<LoadResult>>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        Self {
            config,
            control_panel: ControlPanel::new(),
            dashboard: DashboardView::new(),
            load_rx: HashMap::new(),
        }
    }

    /// Handle file selection for a dataset
    fn handle_browse_file(&mut self, kind: DatasetKind) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Excel or CSV", &["csv", "xlsx", "xls"])
            .pick_file()
        {
            self.control_panel.input_mut(kind).file_path = Some(path.clone());
            self.start_load(kind, Request::File(path));
        }
    }

    /// Handle link entry for a dataset
    fn handle_load_url(&mut self, kind: DatasetKind) {
        let url = self.control_panel.input(kind).url.trim().to_string();
        if url.is_empty() {
            self.control_panel
                .input_mut(kind)
                .set_status("Enter a link to load");
            return;
        }
        self.start_load(kind, Request::Url(url));
    }

    /// Run load → normalize → summarize in a background thread
    fn start_load(&mut self, kind: DatasetKind, request: Request) {
        let (tx, rx) = channel();
        self.load_rx.insert(kind, rx);

        let input = self.control_panel.input_mut(kind);
        input.is_loading = true;
        input.set_status("Loading...");

        let config = self.config.clone();
        thread::spawn(move || {
            let result = Self::run_load(request, kind, &config);
            // The receiver is gone if a newer request replaced this one.
            let _ = tx.send(result);
        });
    }

    /// Run a load (called from background thread)
    fn run_load(request: Request, kind: DatasetKind, config: &DashboardConfig) -> LoadResult {
        let source = match request {
            Request::File(path) => match Source::from_path(&path) {
                Ok(source) => source,
                Err(e) => return LoadResult::Error(e.to_string()),
            },
            Request::Url(url) => Source::Url(url),
        };

        match load_and_summarize(&source, kind, config) {
            Ok(summary) => LoadResult::Complete(summary),
            Err(e) => {
                error!(kind = kind.label(), source = source.label(), error = %e, "load failed");
                LoadResult::Error(e.to_string())
            }
        }
    }

    /// Check for load results
    fn check_load_results(&mut self) {
        let mut finished = Vec::new();

        for (kind, rx) in &self.load_rx {
            if let Ok(result) = rx.try_recv() {
                finished.push((*kind, result));
            }
        }

        for (kind, result) in finished {
            self.load_rx.remove(&kind);
            let input = self.control_panel.input_mut(kind);
            input.is_loading = false;

            match result {
                LoadResult::Complete(summary) => {
                    input.set_status(&format!("Loaded {} rows", summary.total()));
                    input.has_data = true;
                    self.dashboard.set_summary(summary);
                }
                LoadResult::Error(message) => {
                    // The previous summary for this dataset is kept; the other dataset is untouched.
                    input.set_status(&format!("Error: {message}"));
                }
            }
        }
    }

    fn handle_clear(&mut self, kind: DatasetKind) {
        self.dashboard.clear(kind);
        let input = self.control_panel.input_mut(kind);
        input.has_data = false;
        input.file_path = None;
        input.set_status("No data loaded");
    }

    /// Handle summary export - write the current summaries as JSON
    fn handle_export_summary(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("behaviour_summary.json")
            .save_file()
        else {
            return; // User cancelled
        };

        self.control_panel.export_status = match self.export_summary(&path) {
            Ok(()) => {
                info!(path = %path.display(), "summary exported");
                format!("Exported to {}", path.display())
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "summary export failed");
                format!("Error: {e:#}")
            }
        };
    }

    fn export_summary(&self, path: &Path) -> Result<()> {
        let export = SummaryExport {
            detentions: self.dashboard.detentions.as_ref(),
            incidents: self.dashboard.incidents.as_ref(),
        };
        let json = serde_json::to_string_pretty(&export).context("failed to serialize summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if !self.load_rx.is_empty() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseFile(kind) => self.handle_browse_file(kind),
                        ControlPanelAction::LoadUrl(kind) => self.handle_load_url(kind),
                        ControlPanelAction::Clear(kind) => self.handle_clear(kind),
                        ControlPanelAction::ExportSummary => self.handle_export_summary(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboards
        egui::CentralPanel::default().show(ctx, |ui| {
            self.dashboard.show(ui);
        });
    }
}
