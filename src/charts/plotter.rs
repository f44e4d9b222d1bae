//! Chart Plotter Module
//! Draws the dashboard views using egui_plot.

use crate::charts::{HexBin, HexBinner};
use crate::data::{GeoPoint, StreetInjuries, MINUTES_PER_HOUR};
use crate::stats::HourlySummary;
use egui::{Color32, RichText, Stroke};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points, Polygon};
use polars::prelude::DataFrame;

/// Point colour for the injury map.
pub const POINT_COLOR: Color32 = Color32::from_rgb(231, 76, 60);

/// Bar colour for the minute histogram.
pub const BAR_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

/// Density ramp, sparse to dense.
pub const HEAT_PALETTE: [Color32; 6] = [
    Color32::from_rgb(255, 255, 178),
    Color32::from_rgb(254, 217, 118),
    Color32::from_rgb(254, 178, 76),
    Color32::from_rgb(253, 141, 60),
    Color32::from_rgb(240, 59, 32),
    Color32::from_rgb(189, 0, 38),
];

/// Rows shown by the raw data listing.
pub const RAW_PREVIEW_ROWS: usize = 100;

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Palette colour for a bin holding `count` of `max` collisions.
    pub fn heat_color(count: u32, max: u32) -> Color32 {
        if max == 0 {
            return HEAT_PALETTE[0];
        }
        let t = f64::from(count) / f64::from(max);
        let top = HEAT_PALETTE.len() - 1;
        let idx = ((t * top as f64).round() as usize).min(top);
        HEAT_PALETTE[idx]
    }

    /// Scatter of collision coordinates, longitude on x, latitude on y.
    pub fn draw_point_map(ui: &mut egui::Ui, id: &str, points: &[GeoPoint], height: f32) {
        let plot_points: PlotPoints = points.iter().map(|p| [p.longitude, p.latitude]).collect();

        Plot::new(id)
            .height(height)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(plot_points)
                        .radius(2.0)
                        .color(POINT_COLOR.gamma_multiply(0.7))
                        .name("Collisions"),
                );
            });
    }

    /// Hexagon density layer. Bins are drawn sparse first so dense cells sit on top.
    pub fn draw_density(ui: &mut egui::Ui, bins: &[HexBin], binner: &HexBinner, height: f32) {
        let max = bins.first().map(|b| b.count).unwrap_or(0);

        Plot::new("density_map")
            .height(height)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for bin in bins.iter().rev() {
                    let color = Self::heat_color(bin.count, max);
                    let corners: PlotPoints = binner
                        .corners(&bin.center)
                        .iter()
                        .map(|c| [c.longitude, c.latitude])
                        .collect();
                    plot_ui.polygon(
                        Polygon::new(corners)
                            .fill_color(color.gamma_multiply(0.8))
                            .stroke(Stroke::new(0.5, color))
                            .name(format!("{} collisions", bin.count)),
                    );
                }
            });
    }

    /// Bar chart of crashes per minute.
    pub fn draw_minute_histogram(
        ui: &mut egui::Ui,
        histogram: &[u32; MINUTES_PER_HOUR],
        height: f32,
    ) {
        let bars: Vec<Bar> = histogram
            .iter()
            .enumerate()
            .map(|(minute, &crashes)| {
                Bar::new(minute as f64, f64::from(crashes))
                    .width(0.8)
                    .name(format!("minute {minute}: {crashes} crashes"))
            })
            .collect();

        Plot::new("minute_histogram")
            .height(height)
            .legend(Legend::default())
            .x_axis_label("minute")
            .y_axis_label("crashes")
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_x(-1.0)
            .include_x(MINUTES_PER_HOUR as f64)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("crashes"));
            });
    }

    /// Top streets table for one affected category.
    pub fn draw_top_streets(ui: &mut egui::Ui, column: &str, rows: &[StreetInjuries]) {
        if rows.is_empty() {
            ui.label(RichText::new("No injuries recorded").color(Color32::GRAY));
            return;
        }

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id("top_streets"))
                    .striped(true)
                    .min_col_width(80.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("on_street_name").strong());
                        ui.label(RichText::new(column).strong());
                        ui.end_row();

                        for row in rows {
                            ui.label(&row.on_street_name);
                            ui.label(row.injured.to_string());
                            ui.end_row();
                        }
                    });
            });
    }

    /// Count, midpoint and injury figures for the selected hour.
    pub fn draw_hourly_summary(ui: &mut egui::Ui, summary: &HourlySummary) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("{} collisions", summary.count)).strong());
            ui.separator();
            match summary.midpoint {
                Some(mid) => {
                    ui.label(format!("centre {:.4}, {:.4}", mid.latitude, mid.longitude));
                }
                None => {
                    ui.label(RichText::new("no collisions in this hour").color(Color32::GRAY));
                }
            }
            if let Some(mean) = summary.mean_injured {
                ui.separator();
                ui.label(format!(
                    "injured: mean {:.2}, max {}",
                    mean, summary.max_injured
                ));
            }
        });
    }

    /// First rows of the cleaned frame, every column.
    pub fn draw_raw_table(ui: &mut egui::Ui, frame: &DataFrame) {
        let rows = frame.height().min(RAW_PREVIEW_ROWS);
        ui.label(
            RichText::new(format!("Showing {} of {} rows", rows, frame.height()))
                .size(11.0)
                .color(Color32::GRAY),
        );

        egui::ScrollArea::both().max_height(300.0).show(ui, |ui| {
            egui::Grid::new(ui.make_persistent_id("raw_data"))
                .striped(true)
                .spacing([10.0, 2.0])
                .show(ui, |ui| {
                    for column in frame.get_columns() {
                        ui.label(RichText::new(column.name().as_str()).strong().size(11.0));
                    }
                    ui.end_row();

                    for i in 0..rows {
                        for column in frame.get_columns() {
                            let text = column
                                .get(i)
                                .map(|v| {
                                    if v.is_null() {
                                        String::new()
                                    } else {
                                        v.to_string().trim_matches('"').to_string()
                                    }
                                })
                                .unwrap_or_default();
                            ui.label(RichText::new(text).size(11.0));
                        }
                        ui.end_row();
                    }
                });
        });
    }
}
