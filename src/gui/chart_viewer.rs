//! Dashboard Viewer Widget
//! Right side scrollable panel with one card per dashboard view.

use crate::charts::ChartPlotter;
use crate::dashboard::DashboardViews;
use crate::data::CollisionTable;
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const MAP_HEIGHT: f32 = 420.0;
const HISTOGRAM_HEIGHT: f32 = 260.0;

const ACCENT: Color32 = Color32::from_rgb(100, 149, 237);

/// Scrollable area rendering the current views top to bottom.
#[derive(Default)]
pub struct DashboardViewer;

impl DashboardViewer {
    pub fn new() -> Self {
        Self
    }

    /// Draw every card. `table` and `views` come from the same snapshot.
    pub fn show(
        &self,
        ui: &mut egui::Ui,
        table: Option<&CollisionTable>,
        views: Option<&DashboardViews>,
        show_raw: bool,
    ) {
        let (Some(table), Some(views)) = (table, views) else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::card(ui, "Where are the most injuries occurring in NYC?", |ui| {
                    ui.label(
                        RichText::new(format!(
                            "{} collisions with at least {} injured",
                            views.injury_points.len(),
                            views.params.min_injured
                        ))
                        .color(Color32::GRAY),
                    );
                    ChartPlotter::draw_point_map(
                        ui,
                        "injury_map",
                        &views.injury_points,
                        MAP_HEIGHT,
                    );
                });

                Self::card(ui, "How many collisions occurred at a specific time of day?", |ui| {
                    ui.label(RichText::new(views.hourly.window_label()).size(14.0).strong());
                    ChartPlotter::draw_hourly_summary(ui, &views.summary);
                    ui.add_space(6.0);
                    match &views.binner {
                        Some(binner) => {
                            ChartPlotter::draw_density(ui, &views.density_bins, binner, MAP_HEIGHT)
                        }
                        None => {
                            ui.label(RichText::new("Nothing to map").color(Color32::GRAY));
                        }
                    }
                });

                let hour = views.params.hour;
                let heading = format!(
                    "Breakdown by minute between {}:00 and {}:00",
                    hour,
                    (hour + 1) % 24
                );
                Self::card(ui, &heading, |ui| {
                    ChartPlotter::draw_minute_histogram(ui, &views.histogram, HISTOGRAM_HEIGHT);
                });

                Self::card(ui, "Top 5 dangerous streets by affected type", |ui| {
                    ui.label(
                        RichText::new(views.params.category.label()).color(Color32::GRAY),
                    );
                    ChartPlotter::draw_top_streets(
                        ui,
                        views.params.category.column(),
                        &views.top_streets,
                    );
                });

                if show_raw {
                    Self::card(ui, "Raw Data", |ui| {
                        ChartPlotter::draw_raw_table(ui, table.frame());
                    });
                }
            });
    }

    fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, ACCENT))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).size(18.0).strong().color(ACCENT));
                ui.add_space(8.0);
                add_contents(ui);
            });
        ui.add_space(CARD_SPACING);
    }
}
