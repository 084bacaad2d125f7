//! CO₂ Dashboard - Global Emissions Explorer
//!
//! Downloads the OWID CO₂ dataset, cleans it into an in-memory table, and
//! renders interactive per-country and per-year views.

mod charts;
mod data;
mod export;
mod gui;

use eframe::egui;
use gui::DashboardApp;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> eframe::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1100.0, 650.0])
            .with_title("CO₂ Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "CO₂ Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc)))),
    )
}
