//! Static Chart Renderer
//! Renders dashboard views to PNG with plotters, for export.
//!
//! Layouts:
//! - Minute histogram: caption, 60 bars, minute on x and crashes on y
//! - Point map: caption, one dot per collision, longitude on x and latitude on y

use crate::data::{GeoPoint, MINUTES_PER_HOUR};
use image::{ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const BAR_FILL: RGBColor = RGBColor(52, 152, 219);
const POINT_FILL: RGBColor = RGBColor(231, 76, 60);

/// Fraction of the data span added around the point map.
const MAP_PADDING: f64 = 0.05;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Pixel buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err(e: impl Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Per-minute bar chart as PNG bytes. Falls back to bars only when no
    /// font is available for the caption and axis labels.
    pub fn render_histogram_png(
        histogram: &[u32; MINUTES_PER_HOUR],
        caption: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let pixels = Self::draw_histogram(histogram, Some(caption), width, height)
            .or_else(|e| {
                warn!(error = %e, "rendering histogram without text");
                Self::draw_histogram(histogram, None, width, height)
            })?;
        Self::encode_png(pixels, width, height)
    }

    /// Scatter map of collision coordinates as PNG bytes. Falls back to dots
    /// only when no font is available.
    pub fn render_point_map_png(
        points: &[GeoPoint],
        caption: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let pixels = Self::draw_point_map(points, Some(caption), width, height)
            .or_else(|e| {
                warn!(error = %e, "rendering point map without text");
                Self::draw_point_map(points, None, width, height)
            })?;
        Self::encode_png(pixels, width, height)
    }

    fn draw_histogram(
        histogram: &[u32; MINUTES_PER_HOUR],
        caption: Option<&str>,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut pixels = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let y_max = histogram.iter().copied().max().unwrap_or(0).max(1);
            let mut builder = ChartBuilder::on(&root);
            builder.margin(12);
            if let Some(caption) = caption {
                builder
                    .caption(caption, ("sans-serif", 22))
                    .x_label_area_size(35)
                    .y_label_area_size(45);
            }
            let mut chart = builder
                .build_cartesian_2d(
                    (0u32..MINUTES_PER_HOUR as u32 - 1).into_segmented(),
                    0u32..y_max + y_max / 10 + 1,
                )
                .map_err(draw_err)?;

            if caption.is_some() {
                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_desc("minute")
                    .y_desc("crashes")
                    .draw()
                    .map_err(draw_err)?;
            }

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_FILL.filled())
                        .margin(2)
                        .data(
                            histogram
                                .iter()
                                .enumerate()
                                .map(|(minute, &crashes)| (minute as u32, crashes)),
                        ),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(pixels)
    }

    fn draw_point_map(
        points: &[GeoPoint],
        caption: Option<&str>,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut pixels = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let (lon_range, lat_range) = Self::padded_bounds(points).unwrap_or((0.0..1.0, 0.0..1.0));
            let mut builder = ChartBuilder::on(&root);
            builder.margin(12);
            if let Some(caption) = caption {
                builder
                    .caption(caption, ("sans-serif", 22))
                    .x_label_area_size(35)
                    .y_label_area_size(55);
            }
            let mut chart = builder
                .build_cartesian_2d(lon_range, lat_range)
                .map_err(draw_err)?;

            if caption.is_some() {
                chart
                    .configure_mesh()
                    .x_desc("longitude")
                    .y_desc("latitude")
                    .draw()
                    .map_err(draw_err)?;
            }

            chart
                .draw_series(points.iter().map(|p| {
                    Circle::new((p.longitude, p.latitude), 2, POINT_FILL.mix(0.6).filled())
                }))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }
        Ok(pixels)
    }

    /// Write PNG bytes to `path`.
    pub fn save_png(bytes: &[u8], path: &Path) -> Result<(), RenderError> {
        fs::write(path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "exported chart");
        Ok(())
    }

    /// Longitude and latitude ranges covering `points` with a margin.
    pub fn padded_bounds(points: &[GeoPoint]) -> Option<(Range<f64>, Range<f64>)> {
        let first = points.first()?;
        let (mut lon_min, mut lon_max) = (first.longitude, first.longitude);
        let (mut lat_min, mut lat_max) = (first.latitude, first.latitude);
        for p in points {
            lon_min = lon_min.min(p.longitude);
            lon_max = lon_max.max(p.longitude);
            lat_min = lat_min.min(p.latitude);
            lat_max = lat_max.max(p.latitude);
        }

        let pad = |min: f64, max: f64| {
            let span = (max - min).max(1e-3);
            (min - span * MAP_PADDING)..(max + span * MAP_PADDING)
        };
        Some((pad(lon_min, lon_max), pad(lat_min, lat_max)))
    }

    fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, pixels).ok_or(RenderError::Buffer(width, height))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_padded_bounds_empty() {
        assert!(StaticChartRenderer::padded_bounds(&[]).is_none());
    }

    #[test]
    fn test_padded_bounds_cover_points() {
        let points = [
            GeoPoint {
                latitude: 40.6,
                longitude: -74.0,
            },
            GeoPoint {
                latitude: 40.8,
                longitude: -73.8,
            },
        ];
        let (lon, lat) = StaticChartRenderer::padded_bounds(&points).unwrap();

        assert!(lon.start < -74.0 && lon.end > -73.8);
        assert!(lat.start < 40.6 && lat.end > 40.8);
    }

    #[test]
    fn test_padded_bounds_single_point_has_extent() {
        let points = [GeoPoint {
            latitude: 40.7,
            longitude: -73.9,
        }];
        let (lon, lat) = StaticChartRenderer::padded_bounds(&points).unwrap();

        assert!(lon.end > lon.start);
        assert!(lat.end > lat.start);
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = StaticChartRenderer::encode_png(vec![255u8; 4 * 3 * 3], 4, 3).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let err = StaticChartRenderer::encode_png(vec![0u8; 5], 4, 3).unwrap_err();
        assert!(matches!(err, RenderError::Buffer(4, 3)));
    }

    #[test]
    fn test_save_png_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.png");
        let bytes = StaticChartRenderer::encode_png(vec![0u8; 2 * 2 * 3], 2, 2).unwrap();

        StaticChartRenderer::save_png(&bytes, &path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_render_histogram_png() {
        let mut histogram = [0u32; MINUTES_PER_HOUR];
        histogram[15] = 3;
        histogram[45] = 1;

        let bytes = StaticChartRenderer::render_histogram_png(
            &histogram,
            "Collisions between 8:00 and 9:00",
            320,
            240,
        )
        .unwrap();

        assert_eq!(&bytes[..8], PNG_SIGNATURE);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (320, 240));
    }

    #[test]
    fn test_render_point_map_png() {
        let points = [
            GeoPoint {
                latitude: 40.6,
                longitude: -74.0,
            },
            GeoPoint {
                latitude: 40.8,
                longitude: -73.8,
            },
        ];

        let bytes =
            StaticChartRenderer::render_point_map_png(&points, "Injuries", 300, 200).unwrap();

        assert_eq!(&bytes[..8], PNG_SIGNATURE);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (300, 200));
    }

    #[test]
    fn test_render_without_text_draws_bars() {
        let mut histogram = [0u32; MINUTES_PER_HOUR];
        histogram[30] = 5;

        let pixels = StaticChartRenderer::draw_histogram(&histogram, None, 120, 80).unwrap();

        assert_eq!(pixels.len(), 120 * 80 * 3);
        assert!(pixels.chunks(3).any(|px| px != [255, 255, 255]));
    }

    #[test]
    fn test_render_empty_point_map() {
        let bytes = StaticChartRenderer::render_point_map_png(&[], "Nothing", 100, 100).unwrap();
        assert_eq!(&bytes[..8], PNG_SIGNATURE);
    }
}
