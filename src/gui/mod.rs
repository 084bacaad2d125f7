//! GUI module - User interface components

mod app;
mod chart_view;
mod control_panel;

pub use app::DashboardApp;
pub use chart_view::ChartView;
pub use control_panel::{ControlPanel, ControlPanelAction, UserSettings, View};
