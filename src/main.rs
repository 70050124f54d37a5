//! Behaviour Dashboard - Detention & On-Call Monitoring
//!
//! Desktop dashboard for school detention and on-call incident logs.

mod charts;
mod gui;

use behaviour_dashboard::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> eframe::Result<()> {
    init_logging();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "falling back to default config");
        DashboardConfig::default()
    });

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Behaviour Dashboard"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Behaviour Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
}
