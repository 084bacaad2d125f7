//! Chart View Widget
//! Central panel showing the active view's chart, or a placeholder.

use egui::RichText;

use crate::charts::ChartPlotter;
use crate::data::PreparedTable;
use crate::gui::control_panel::{UserSettings, View};

pub struct ChartView;

impl ChartView {
    /// Draw the active view against the current table.
    pub fn show(
        ui: &mut egui::Ui,
        table: Option<&PreparedTable>,
        settings: &UserSettings,
        is_loading: bool,
    ) {
        let Some(table) = table else {
            Self::placeholder(
                ui,
                if is_loading {
                    "Loading dataset…"
                } else {
                    "No dataset loaded"
                },
            );
            return;
        };

        match settings.view {
            View::CountrySeries => Self::show_series(ui, table, settings),
            View::WorldSnapshot => Self::show_snapshot(ui, table, settings),
        }
    }

    fn show_series(ui: &mut egui::Ui, table: &PreparedTable, settings: &UserSettings) {
        let series = table.series_for(&settings.country, settings.smooth_window);
        if series.is_empty() {
            Self::placeholder(ui, "No data available for the selected country.");
            return;
        }

        // series_for collapses the window for short series; mirror that in
        // the heading and legend.
        let window = effective_window(series.len(), settings.smooth_window);

        ui.add_space(5.0);
        ui.label(
            RichText::new(format!(
                "CO₂ Emissions — {} (smoothed: {window} yr)",
                settings.country
            ))
            .size(18.0)
            .strong(),
        );
        ui.add_space(8.0);
        ChartPlotter::draw_series_summary(ui, &settings.country, &series);
        ui.add_space(8.0);
        ChartPlotter::draw_series_chart(ui, &settings.country, window, &series);
    }

    fn show_snapshot(ui: &mut egui::Ui, table: &PreparedTable, settings: &UserSettings) {
        let rows = table.snapshot_for(settings.year);
        if rows.is_empty() {
            Self::placeholder(ui, "No data for selected year.");
            return;
        }

        ui.add_space(5.0);
        ui.label(
            RichText::new(format!(
                "CO₂ Emissions Worldwide — {} ({} countries)",
                settings.year,
                rows.len()
            ))
            .size(18.0)
            .strong(),
        );
        ui.add_space(8.0);
        ChartPlotter::draw_snapshot_chart(ui, settings.year, &rows);
    }

    fn placeholder(ui: &mut egui::Ui, text: &str) {
        ui.centered_and_justified(|ui| {
            ui.label(RichText::new(text).size(20.0));
        });
    }
}

/// Window actually applied by the series query.
pub fn effective_window(series_len: usize, requested: usize) -> usize {
    if series_len < requested {
        1
    } else {
        requested.max(1)
    }
}
