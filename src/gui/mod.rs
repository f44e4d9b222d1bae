//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::CollisionApp;
pub use chart_viewer::DashboardViewer;
pub use control_panel::{ControlPanel, ControlPanelAction, UserSettings};
