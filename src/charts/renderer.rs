//! Static Chart Renderer
//! Renders the dashboard charts to PNG files with plotters, for export.

use std::path::Path;

use anyhow::{anyhow, Result};
use plotters::prelude::*;

use crate::data::{SeriesPoint, SnapshotRow};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const MAX_BARS: usize = 30;

const ACTUAL: RGBColor = RGBColor(52, 152, 219);
const SMOOTHED: RGBColor = RGBColor(231, 76, 60);

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {e}")
}

fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(254.0, 165.0), lerp(229.0, 15.0), lerp(217.0, 21.0))
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Write a country's emissions series (actual + rolling mean) as a PNG.
    pub fn render_series_png(
        path: &Path,
        country: &str,
        window: usize,
        series: &[SeriesPoint],
    ) -> Result<()> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(anyhow!("nothing to render: series is empty"));
        };

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let x_min = first.year;
        let x_max = last.year.max(x_min + 1);
        let y_max = series.iter().fold(0.0f64, |m, p| m.max(p.co2)) * 1.05;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("CO₂ Emissions — {country} (smoothed: {window} yr)"),
                ("sans-serif", 28),
            )
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("CO₂ (million tonnes)")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                series.iter().map(|p| (p.year, p.co2)),
                ACTUAL.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label("Actual")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], ACTUAL.stroke_width(2)));

        chart
            .draw_series(LineSeries::new(
                series
                    .iter()
                    .filter_map(|p| p.smoothed.map(|s| (p.year, s))),
                SMOOTHED.stroke_width(3),
            ))
            .map_err(draw_err)?
            .label(format!("{window}-yr mean"))
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], SMOOTHED.stroke_width(3))
            });

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Write the year's top emitters as a horizontal bar chart PNG.
    pub fn render_snapshot_png(path: &Path, year: i32, rows: &[SnapshotRow]) -> Result<()> {
        if rows.is_empty() {
            return Err(anyhow!("nothing to render: no rows for {year}"));
        }

        let mut ranked: Vec<&SnapshotRow> = rows.iter().collect();
        ranked.sort_by(|a, b| b.co2.partial_cmp(&a.co2).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_BARS);

        let max_co2 = ranked[0].co2;
        let count = ranked.len();

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        // Extra x headroom keeps the country labels inside the plot area.
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("CO₂ Emissions Worldwide — {year}"),
                ("sans-serif", 28),
            )
            .margin(20)
            .x_label_area_size(45)
            .build_cartesian_2d(0f64..max_co2 * 1.35, 0f64..count as f64)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(0)
            .x_desc("CO₂ (million tonnes)")
            .draw()
            .map_err(draw_err)?;

        for (rank, row) in ranked.iter().enumerate() {
            let y0 = (count - 1 - rank) as f64 + 0.15;
            let y1 = y0 + 0.7;
            let color = heat_color(row.co2 / max_co2);

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(0.0, y0), (row.co2, y1)],
                    color.filled(),
                )))
                .map_err(draw_err)?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{} — {:.1}", row.country, row.co2),
                    (row.co2 + max_co2 * 0.02, y0 + 0.15),
                    ("sans-serif", 16),
                )))
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}
