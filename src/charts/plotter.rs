//! Chart Plotter Module
//! Interactive emissions charts using egui_plot.

use crate::data::{SeriesPoint, SnapshotRow};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

/// Raw yearly values.
pub const ACTUAL_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
/// Centered rolling mean.
pub const SMOOTHED_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red

/// Bars shown in the world view; the tail of ~200 countries is unreadable.
const MAX_BARS: usize = 30;

/// Creates the dashboard's interactive charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Sequential red ramp for emission intensity, `t` in 0..=1.
    pub fn heat_color(t: f64) -> Color32 {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
        Color32::from_rgb(lerp(254.0, 165.0), lerp(229.0, 15.0), lerp(217.0, 21.0))
    }

    /// Line chart of one country's emissions: actual values plus the
    /// centered rolling mean.
    pub fn draw_series_chart(
        ui: &mut egui::Ui,
        country: &str,
        window: usize,
        series: &[SeriesPoint],
    ) {
        let actual: PlotPoints = series
            .iter()
            .map(|p| [f64::from(p.year), p.co2])
            .collect();

        // Smoothed values are None only at the series edges, so the line
        // never bridges an interior gap.
        let smoothed: PlotPoints = series
            .iter()
            .filter_map(|p| p.smoothed.map(|s| [f64::from(p.year), s]))
            .collect();

        Plot::new(format!("series_{country}"))
            .height((ui.available_height() - 10.0).max(300.0))
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label("CO₂ (million tonnes)")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(actual)
                        .color(ACTUAL_COLOR)
                        .width(1.5)
                        .name("Actual"),
                );
                plot_ui.line(
                    Line::new(smoothed)
                        .color(SMOOTHED_COLOR)
                        .width(2.5)
                        .name(format!("{window}-yr mean")),
                );
            });
    }

    /// Horizontal bar chart of the year's top emitters, heat-colored
    /// relative to the year's maximum.
    pub fn draw_snapshot_chart(ui: &mut egui::Ui, year: i32, rows: &[SnapshotRow]) {
        let mut ranked: Vec<&SnapshotRow> = rows.iter().collect();
        ranked.sort_by(|a, b| b.co2.partial_cmp(&a.co2).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_BARS);

        let max_co2 = ranked.first().map(|r| r.co2).unwrap_or(1.0);
        let count = ranked.len();

        // Largest emitter at the top of the axis.
        let mut labels = vec![String::new(); count];
        let bars: Vec<Bar> = ranked
            .iter()
            .enumerate()
            .map(|(rank, row)| {
                let position = (count - 1 - rank) as f64;
                labels[count - 1 - rank] = row.country.clone();
                Bar::new(position, row.co2)
                    .width(0.7)
                    .fill(Self::heat_color(row.co2 / max_co2))
                    .name(format!("{} ({})", row.country, row.iso_code))
            })
            .collect();

        Plot::new(format!("snapshot_{year}"))
            .height((ui.available_height() - 10.0).max(300.0))
            .allow_scroll(false)
            .x_axis_label("CO₂ (million tonnes)")
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Compact summary grid for a country's series.
    pub fn draw_series_summary(ui: &mut egui::Ui, country: &str, series: &[SeriesPoint]) {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return;
        };
        let peak = series
            .iter()
            .fold(first, |best, p| if p.co2 > best.co2 { p } else { best });
        let mean = series.iter().map(|p| p.co2).sum::<f64>() / series.len() as f64;

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("summary_{country}")))
                    .striped(true)
                    .min_col_width(90.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Years").strong().size(11.0));
                        ui.label(RichText::new("Latest").strong().size(11.0));
                        ui.label(RichText::new("Peak").strong().size(11.0));
                        ui.label(RichText::new("Mean").strong().size(11.0));
                        ui.end_row();

                        ui.label(
                            RichText::new(format!(
                                "{}–{} ({})",
                                first.year,
                                last.year,
                                series.len()
                            ))
                            .size(11.0),
                        );
                        ui.label(
                            RichText::new(format!("{:.1} Mt ({})", last.co2, last.year)).size(11.0),
                        );
                        ui.label(
                            RichText::new(format!("{:.1} Mt ({})", peak.co2, peak.year)).size(11.0),
                        );
                        ui.label(RichText::new(format!("{mean:.1} Mt")).size(11.0));
                        ui.end_row();
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_color_spans_the_ramp() {
        assert_eq!(ChartPlotter::heat_color(0.0), Color32::from_rgb(254, 229, 217));
        assert_eq!(ChartPlotter::heat_color(1.0), Color32::from_rgb(165, 15, 21));
        // Out-of-range inputs clamp instead of wrapping.
        assert_eq!(ChartPlotter::heat_color(-1.0), ChartPlotter::heat_color(0.0));
        assert_eq!(ChartPlotter::heat_color(2.0), ChartPlotter::heat_color(1.0));
    }
}
