//! CO₂ Dashboard Main Application
//! Main window wiring: background loading, control panel, chart views.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use egui::SidePanel;
use tracing::{error, info};

use crate::charts::StaticChartRenderer;
use crate::data::{prepare_from_csv_bytes, DatasetFetcher, PreparedTable};
use crate::export;
use crate::gui::chart_view::{effective_window, ChartView};
use crate::gui::{ControlPanel, ControlPanelAction, View};

/// Load result from the background thread.
enum LoadResult {
    Progress(f32, String),
    Complete(PreparedTable),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    fetcher: Option<Arc<Mutex<DatasetFetcher>>>,
    table: Option<PreparedTable>,
    control_panel: ControlPanel,

    // Async dataset loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (fetcher, init_error) = match DatasetFetcher::owid() {
            Ok(f) => (Some(Arc::new(Mutex::new(f))), None),
            Err(e) => (None, Some(e.to_string())),
        };

        let mut app = Self {
            fetcher,
            table: None,
            control_panel: ControlPanel::new(),
            load_rx: None,
            is_loading: false,
        };

        // Load once at startup; the UI stays responsive meanwhile.
        match init_error {
            None => app.start_remote_load(),
            Some(e) => app.control_panel.set_progress(0.0, &format!("Error: {e}")),
        }
        app
    }

    /// Fetch (memoized) and prepare in a background thread.
    fn start_remote_load(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(fetcher) = self.fetcher.clone() else {
            self.control_panel
                .set_progress(0.0, "Error: no HTTP client available");
            return;
        };

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.source = "Our World in Data (remote)".to_string();
        self.control_panel.set_progress(5.0, "Downloading dataset...");

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(10.0, "Downloading dataset...".to_string()));

            let bytes = match fetcher.lock() {
                Ok(mut fetcher) => fetcher.fetch(),
                Err(_) => {
                    let _ = tx.send(LoadResult::Error("fetcher lock poisoned".to_string()));
                    return;
                }
            };

            match bytes {
                Ok(bytes) => Self::prepare_and_send(tx, &bytes),
                Err(e) => {
                    error!("dataset download failed: {e}");
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Run a local CSV file through the same preparer.
    fn start_file_load(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.control_panel.set_progress(5.0, "Reading CSV file...");

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(10.0, "Reading CSV file...".to_string()));
            match std::fs::read(&path) {
                Ok(bytes) => Self::prepare_and_send(tx, &bytes),
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Shared tail of both load paths (called from background threads).
    fn prepare_and_send(tx: Sender<LoadResult>, bytes: &[u8]) {
        let _ = tx.send(LoadResult::Progress(60.0, "Preparing table...".to_string()));
        match prepare_from_csv_bytes(bytes) {
            Ok(table) => {
                let _ = tx.send(LoadResult::Complete(table));
            }
            Err(e) => {
                error!("dataset preparation failed: {e}");
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for load results from the background thread.
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(table) => {
                        info!("table installed: {} rows", table.len());
                        self.control_panel
                            .update_for_table(table.countries(), table.year_range());
                        self.control_panel.set_progress(
                            100.0,
                            &format!("Table ready: {} rows, {}", table.len(), table.dropped()),
                        );
                        // The old table stays visible until this moment; the
                        // swap is a single assignment.
                        self.table = Some(table);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {error}"));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }

        // try_lock: the background thread holds the fetcher for the whole
        // download, and the UI must not wait on it.
        if let Some(fetcher) = &self.fetcher {
            if let Ok(fetcher) = fetcher.try_lock() {
                self.control_panel.can_save_raw = fetcher.is_cached();
            }
        }
    }

    /// Drop the memoized bytes and download again.
    fn handle_reload(&mut self) {
        if self.is_loading {
            return;
        }
        if let Some(fetcher) = &self.fetcher {
            if let Ok(mut fetcher) = fetcher.lock() {
                fetcher.invalidate();
            }
        }
        self.start_remote_load();
    }

    fn handle_open_csv(&mut self) {
        if self.is_loading {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_file_load(path);
        }
    }

    /// Save the cached download untouched (handy for offline runs).
    fn handle_save_raw(&mut self) {
        let Some(bytes) = self
            .fetcher
            .as_ref()
            .and_then(|f| f.try_lock().ok().and_then(|f| f.raw_bytes().map(|b| b.to_vec())))
        else {
            self.control_panel
                .set_progress(0.0, "No downloaded bytes to save");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("owid-co2-data.csv")
            .save_file()
        else {
            return;
        };

        match std::fs::write(&path, bytes) {
            Ok(()) => self
                .control_panel
                .set_progress(100.0, &format!("Raw CSV saved to {}", path.display())),
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: could not save raw CSV: {e}")),
        }
    }

    fn handle_export_chart(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let settings = self.control_panel.settings.clone();

        let result = match settings.view {
            View::CountrySeries => {
                let series = table.series_for(&settings.country, settings.smooth_window);
                if series.is_empty() {
                    self.control_panel.set_progress(0.0, "No chart to export");
                    return;
                }
                let window = effective_window(series.len(), settings.smooth_window);
                let Some(path) = Self::save_dialog(
                    "PNG Image",
                    "png",
                    &format!("co2_{}.png", settings.country.replace(' ', "_")),
                ) else {
                    return;
                };
                StaticChartRenderer::render_series_png(&path, &settings.country, window, &series)
                    .map(|()| path)
            }
            View::WorldSnapshot => {
                let rows = table.snapshot_for(settings.year);
                if rows.is_empty() {
                    self.control_panel.set_progress(0.0, "No chart to export");
                    return;
                }
                let Some(path) = Self::save_dialog(
                    "PNG Image",
                    "png",
                    &format!("co2_world_{}.png", settings.year),
                ) else {
                    return;
                };
                StaticChartRenderer::render_snapshot_png(&path, settings.year, &rows)
                    .map(|()| path)
            }
        };

        match result {
            Ok(path) => self
                .control_panel
                .set_progress(100.0, &format!("Chart saved to {}", path.display())),
            Err(e) => self.control_panel.set_progress(0.0, &format!("Error: {e}")),
        }
    }

    fn handle_export_data(&mut self, json: bool) {
        let Some(table) = &self.table else {
            return;
        };
        let settings = self.control_panel.settings.clone();
        let ext = if json { "json" } else { "csv" };

        let result = match settings.view {
            View::CountrySeries => {
                let series = table.series_for(&settings.country, settings.smooth_window);
                if series.is_empty() {
                    self.control_panel.set_progress(0.0, "No data to export");
                    return;
                }
                let window = effective_window(series.len(), settings.smooth_window);
                let Some(path) = Self::save_dialog(
                    "Data",
                    ext,
                    &format!("co2_{}.{ext}", settings.country.replace(' ', "_")),
                ) else {
                    return;
                };
                if json {
                    export::write_series_json(&path, &settings.country, window, &series)
                } else {
                    export::write_series_csv(&path, &settings.country, &series)
                }
                .map(|()| path)
            }
            View::WorldSnapshot => {
                let rows = table.snapshot_for(settings.year);
                if rows.is_empty() {
                    self.control_panel.set_progress(0.0, "No data to export");
                    return;
                }
                let Some(path) =
                    Self::save_dialog("Data", ext, &format!("co2_world_{}.{ext}", settings.year))
                else {
                    return;
                };
                if json {
                    export::write_snapshot_json(&path, settings.year, &rows)
                } else {
                    export::write_snapshot_csv(&path, &rows)
                }
                .map(|()| path)
            }
        };

        match result {
            Ok(path) => self
                .control_panel
                .set_progress(100.0, &format!("Data saved to {}", path.display())),
            Err(e) => self.control_panel.set_progress(0.0, &format!("Error: {e}")),
        }
    }

    fn save_dialog(filter_name: &str, ext: &str, default_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter(filter_name, &[ext])
            .set_file_name(default_name)
            .save_file()
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while the background load runs.
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - controls
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::ReloadRemote => self.handle_reload(),
                        ControlPanelAction::OpenCsvFile => self.handle_open_csv(),
                        ControlPanelAction::SaveRawCsv => self.handle_save_raw(),
                        ControlPanelAction::ExportChartPng => self.handle_export_chart(),
                        ControlPanelAction::ExportDataCsv => self.handle_export_data(false),
                        ControlPanelAction::ExportDataJson => self.handle_export_data(true),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - active chart
        egui::CentralPanel::default().show(ctx, |ui| {
            ChartView::show(
                ui,
                self.table.as_ref(),
                &self.control_panel.settings,
                self.is_loading,
            );
        });
    }
}
