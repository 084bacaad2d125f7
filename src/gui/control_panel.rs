//! Control Panel Widget
//! Left side panel with data source controls, view switch, and settings.

use egui::{Color32, ComboBox, RichText};

/// The two dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    CountrySeries,
    WorldSnapshot,
}

/// User selections driving the charts.
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub view: View,
    pub country: String,
    pub smooth_window: usize,
    pub year: i32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            view: View::default(),
            country: String::new(),
            smooth_window: 5,
            year: 2020,
        }
    }
}

/// Actions triggered by control panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    ReloadRemote,
    OpenCsvFile,
    SaveRawCsv,
    ExportChartPng,
    ExportDataCsv,
    ExportDataJson,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub countries: Vec<String>,
    pub year_bounds: Option<(i32, i32)>,
    pub source: String,
    pub progress: f32,
    pub status: String,
    pub controls_enabled: bool,
    pub can_save_raw: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            countries: Vec::new(),
            year_bounds: None,
            source: "Our World in Data (remote)".to_string(),
            progress: 0.0,
            status: "Starting...".to_string(),
            controls_enabled: false,
            can_save_raw: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh country list and year bounds after a new table arrives,
    /// keeping the current selection when it still exists.
    pub fn update_for_table(&mut self, countries: Vec<String>, year_bounds: Option<(i32, i32)>) {
        if !countries.iter().any(|c| *c == self.settings.country) {
            self.settings.country = countries
                .iter()
                .find(|c| c.as_str() == "Austria")
                .or_else(|| countries.first())
                .cloned()
                .unwrap_or_default();
        }
        if let Some((lo, hi)) = year_bounds {
            self.settings.year = self.settings.year.clamp(lo, hi);
        }
        self.countries = countries;
        self.year_bounds = year_bounds;
        self.controls_enabled = !self.countries.is_empty();
    }

    /// Set progress and status.
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }

    /// Draw the control panel.
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌍 CO₂ Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Global emissions explorer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source).size(12.0));
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if ui.button("⟳ Reload").clicked() {
                        action = ControlPanelAction::ReloadRemote;
                    }
                    if ui.button("📂 Open CSV…").clicked() {
                        action = ControlPanelAction::OpenCsvFile;
                    }
                    ui.add_enabled_ui(self.can_save_raw, |ui| {
                        if ui.button("💾 Save raw…").clicked() {
                            action = ControlPanelAction::SaveRawCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== View Section =====
        ui.label(RichText::new("📊 View").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.selectable_value(
                &mut self.settings.view,
                View::CountrySeries,
                "📈 Time Series",
            );
            ui.selectable_value(
                &mut self.settings.view,
                View::WorldSnapshot,
                "🌍 World View",
            );
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== View Settings Section =====
        ui.label(RichText::new("⚙ Settings").size(14.0).strong());
        ui.add_space(8.0);

        ui.add_enabled_ui(self.controls_enabled, |ui| match self.settings.view {
            View::CountrySeries => {
                ui.horizontal(|ui| {
                    ui.add_sized([100.0, 20.0], egui::Label::new("Country:"));
                    ComboBox::from_id_salt("country")
                        .width(160.0)
                        .selected_text(&self.settings.country)
                        .show_ui(ui, |ui| {
                            for country in &self.countries {
                                if ui
                                    .selectable_label(self.settings.country == *country, country)
                                    .clicked()
                                {
                                    self.settings.country = country.clone();
                                }
                            }
                        });
                });

                ui.add_space(5.0);

                ui.horizontal(|ui| {
                    ui.add_sized([100.0, 20.0], egui::Label::new("Rolling mean:"));
                    ui.add(
                        egui::Slider::new(&mut self.settings.smooth_window, 1..=20)
                            .suffix(" yr"),
                    );
                });
            }
            View::WorldSnapshot => {
                let (lo, hi) = self.year_bounds.unwrap_or((1750, 2023));
                ui.horizontal(|ui| {
                    ui.add_sized([100.0, 20.0], egui::Label::new("Year:"));
                    ui.add(egui::Slider::new(&mut self.settings.year, lo..=hi));
                });
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.label(RichText::new("📤 Export").size(14.0).strong());
        ui.add_space(5.0);

        ui.add_enabled_ui(self.controls_enabled, |ui| {
            ui.horizontal(|ui| {
                if ui.button("📄 Chart PNG…").clicked() {
                    action = ControlPanelAction::ExportChartPng;
                }
                if ui.button("CSV…").clicked() {
                    action = ControlPanelAction::ExportDataCsv;
                }
                if ui.button("JSON…").clicked() {
                    action = ControlPanelAction::ExportDataJson;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("ready") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        ui.add_space(10.0);
        ui.separator();
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new("Data: Our World in Data")
                    .size(10.0)
                    .color(Color32::GRAY),
            );
        });

        action
    }
}
