//! Control Panel Widget
//! Left side panel with the data source, view filters and export controls.

use crate::dashboard::ViewParams;
use crate::data::{AffectedCategory, MAX_INJURY_FILTER};
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// User settings for the dashboard
#[derive(Clone)]
pub struct UserSettings {
    pub data_path: PathBuf,
    pub nrows: usize,
    pub show_raw: bool,
    pub params: ViewParams,
}

/// Left side control panel with file selection, filters and progress.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub row_count: usize,
    pub status: String,
    pub is_loading: bool,
    pub has_data: bool,
}

impl ControlPanel {
    pub fn new(data_path: PathBuf, nrows: usize) -> Self {
        Self {
            settings: UserSettings {
                data_path,
                nrows,
                show_raw: false,
                params: ViewParams::default(),
            },
            row_count: 0,
            status: "Ready".to_string(),
            is_loading: false,
            has_data: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 Collision Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Motor vehicle collisions in New York")
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
                ui.horizontal(|ui| {
                    let file_name = self
                        .settings
                        .data_path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());
                    ui.label(RichText::new(file_name).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.is_loading, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseData;
                            }
                        });
                    });
                });

                ui.horizontal(|ui| {
                    ui.label("Rows to read:");
                    ui.add(
                        egui::DragValue::new(&mut self.settings.nrows)
                            .range(1..=10_000_000)
                            .speed(1000.0),
                    );
                    ui.add_enabled_ui(!self.is_loading, |ui| {
                        if ui
                            .button("⟳ Reload")
                            .on_hover_text("Reads the file again if it changed on disk")
                            .clicked()
                        {
                            action = ControlPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(5.0);
        if ui
            .checkbox(&mut self.settings.show_raw, "Show Raw Data")
            .changed()
        {
            action = ControlPanelAction::ParamsChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let params = &mut self.settings.params;

        ui.label("Number of persons injured in collisions");
        if ui
            .add(egui::Slider::new(&mut params.min_injured, 0..=MAX_INJURY_FILTER))
            .changed()
        {
            action = ControlPanelAction::ParamsChanged;
        }

        ui.add_space(8.0);
        ui.label("Hours to look at...");
        if ui
            .add(egui::Slider::new(&mut params.hour, 0..=23))
            .changed()
        {
            action = ControlPanelAction::ParamsChanged;
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Affected type of people:");
            ComboBox::from_id_salt("affected_category")
                .width(130.0)
                .selected_text(params.category.label())
                .show_ui(ui, |ui| {
                    for category in AffectedCategory::ALL {
                        if ui
                            .selectable_value(&mut params.category, category, category.label())
                            .changed()
                        {
                            action = ControlPanelAction::ParamsChanged;
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.has_data, |ui| {
                let button = egui::Button::new(RichText::new("📊 Export Histogram PNG").size(14.0))
                    .min_size(egui::vec2(200.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportHistogram;
                }

                ui.add_space(8.0);

                let button = egui::Button::new(RichText::new("🗺 Export Map PNG").size(14.0))
                    .min_size(egui::vec2(200.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportMap;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📋 Status").size(14.0).strong());
        ui.add_space(5.0);

        if self.is_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading...");
            });
        } else if self.has_data {
            ui.label(format!("{} collisions loaded", self.row_count));
        }

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set status line
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseData,
    Reload,
    ParamsChanged,
    ExportHistogram,
    ExportMap,
}
