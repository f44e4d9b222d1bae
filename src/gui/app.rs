//! Collision Explorer Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::dashboard::DashboardViews;
use crate::data::{CollisionTable, TableCache};
use crate::gui::{ControlPanel, ControlPanelAction, DashboardViewer};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

const EXPORT_WIDTH: u32 = 1400;
const EXPORT_HEIGHT: u32 = 1000;

/// Loading result from background thread
enum LoadResult {
    Complete(Arc<CollisionTable>),
    Error(String),
}

/// Main application window.
pub struct CollisionApp {
    config: AppConfig,
    cache: Arc<TableCache>,
    control_panel: ControlPanel,
    viewer: DashboardViewer,

    table: Option<Arc<CollisionTable>>,
    views: Option<DashboardViews>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CollisionApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let control_panel = ControlPanel::new(config.data_path.clone(), config.nrows);
        let mut app = Self {
            config,
            cache: Arc::new(TableCache::new()),
            control_panel,
            viewer: DashboardViewer::new(),
            table: None,
            views: None,
            load_rx: None,
            is_loading: false,
        };

        if app.control_panel.settings.data_path.exists() {
            app.start_load();
        } else {
            app.control_panel.set_status("Select a collisions CSV or zip file");
        }
        app
    }

    /// Load the selected dataset in a background thread
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        let path = self.control_panel.settings.data_path.clone();
        let nrows = self.control_panel.settings.nrows;
        let cache = Arc::clone(&self.cache);

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.is_loading = true;
        self.control_panel
            .set_status(&format!("Loading {}...", path.display()));

        thread::spawn(move || {
            let result = match cache.get_or_load(&path, nrows) {
                Ok(table) => LoadResult::Complete(table),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(table)) => {
                self.control_panel.row_count = table.len();
                self.control_panel.has_data = true;
                self.control_panel.set_status(&format!(
                    "Loaded {} rows, {} columns",
                    table.len(),
                    table.column_names().len()
                ));
                self.table = Some(table);
                self.finish_load();
                self.recompute_views();
            }
            Ok(LoadResult::Error(e)) => {
                error!(error = %e, "load failed");
                self.control_panel.set_status(&format!("Error: {e}"));
                self.finish_load();
            }
            Err(_) => self.load_rx = Some(rx),
        }
    }

    fn finish_load(&mut self) {
        self.is_loading = false;
        self.control_panel.is_loading = false;
    }

    /// Rebuild every view from the current table and parameters
    fn recompute_views(&mut self) {
        let Some(table) = &self.table else {
            return;
        };

        match DashboardViews::compute(
            table,
            self.control_panel.settings.params,
            &self.config.density,
        ) {
            Ok(views) => self.views = Some(views),
            Err(e) => {
                warn!(error = %e, "view computation failed");
                self.control_panel.set_status(&format!("Error: {e}"));
            }
        }
    }

    /// Handle dataset selection
    fn handle_browse_data(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Collision data", &["csv", "zip"])
            .pick_file()
        {
            self.control_panel.settings.data_path = path;
            self.start_load();
        }
    }

    /// Apply the selected source and row count. The cache only reads the
    /// file again when it changed on disk or the row count differs.
    fn handle_reload(&mut self) {
        self.start_load();
    }

    fn pick_png_path(default_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(default_name)
            .save_file()
    }

    /// Export the minute histogram of the selected hour
    fn handle_export_histogram(&mut self) {
        let Some(views) = &self.views else {
            self.control_panel.set_status("No views to export");
            return;
        };
        let Some(path) = Self::pick_png_path("minute_histogram.png") else {
            return;
        };

        let caption = views.hourly.window_label();
        let result = StaticChartRenderer::render_histogram_png(
            &views.histogram,
            &caption,
            EXPORT_WIDTH,
            EXPORT_HEIGHT,
        )
        .and_then(|bytes| StaticChartRenderer::save_png(&bytes, &path));
        self.report_export(result, &path);
    }

    /// Export the injury map
    fn handle_export_map(&mut self) {
        let Some(views) = &self.views else {
            self.control_panel.set_status("No views to export");
            return;
        };
        let Some(path) = Self::pick_png_path("injury_map.png") else {
            return;
        };

        let caption = format!(
            "Collisions with at least {} injured",
            views.params.min_injured
        );
        let result = StaticChartRenderer::render_point_map_png(
            &views.injury_points,
            &caption,
            EXPORT_WIDTH,
            EXPORT_HEIGHT,
        )
        .and_then(|bytes| StaticChartRenderer::save_png(&bytes, &path));
        self.report_export(result, &path);
    }

    fn report_export(
        &mut self,
        result: Result<(), crate::charts::RenderError>,
        path: &std::path::Path,
    ) {
        match result {
            Ok(()) => {
                info!(path = %path.display(), "chart exported");
                self.control_panel
                    .set_status(&format!("Exported {}", path.display()));
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.control_panel.set_status(&format!("Export Error: {e}"));
            }
        }
    }
}

impl eframe::App for CollisionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseData => self.handle_browse_data(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ParamsChanged => self.recompute_views(),
                        ControlPanelAction::ExportHistogram => self.handle_export_histogram(),
                        ControlPanelAction::ExportMap => self.handle_export_map(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.show(
                ui,
                self.table.as_deref(),
                self.views.as_ref(),
                self.control_panel.settings.show_raw,
            );
        });
    }
}
