//! Collision Explorer - interactive dashboard over motor vehicle collision records.
//!
//! The crate loads a collisions CSV (plain or zipped) into an immutable
//! [`data::CollisionTable`], derives the dashboard views from it with
//! [`dashboard::DashboardViews`], and renders them in an egui window.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod gui;
pub mod stats;
