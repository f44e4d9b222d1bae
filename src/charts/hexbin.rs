//! Hexagon Binning Module
//! Aggregates collision points into pointy-top hexagons for the density layer.

use crate::data::GeoPoint;
use serde::Serialize;
use std::collections::BTreeMap;

/// Metres per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

const SQRT_3: f64 = 1.732_050_807_568_877;

/// One populated hexagon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HexBin {
    pub center: GeoPoint,
    pub count: u32,
    /// Column height for 3D rendering, in metres.
    pub elevation: f64,
}

/// Bins points into hexagons of a fixed radius around a reference latitude.
#[derive(Debug, Clone, Copy)]
pub struct HexBinner {
    radius_m: f64,
    elevation_scale: f64,
    elevation_max: f64,
    meters_per_degree_lon: f64,
}

impl HexBinner {
    /// `reference_latitude` fixes the longitude scale; use the view midpoint.
    pub fn new(
        radius_m: f64,
        elevation_scale: f64,
        elevation_max: f64,
        reference_latitude: f64,
    ) -> Self {
        Self {
            radius_m,
            elevation_scale,
            elevation_max,
            meters_per_degree_lon: METERS_PER_DEGREE * reference_latitude.to_radians().cos(),
        }
    }

    /// Populated bins, densest first. Ties are ordered by grid position.
    pub fn bin(&self, points: &[GeoPoint]) -> Vec<HexBin> {
        let mut counts: BTreeMap<(i64, i64), u32> = BTreeMap::new();
        for point in points {
            *counts.entry(self.cell_of(point)).or_default() += 1;
        }

        let max = counts.values().copied().max().unwrap_or(0);
        let mut bins: Vec<HexBin> = counts
            .into_iter()
            .map(|((q, r), count)| HexBin {
                center: self.center_of(q, r),
                count,
                elevation: f64::from(count) / f64::from(max) * self.elevation_max
                    * self.elevation_scale,
            })
            .collect();
        bins.sort_by(|a, b| b.count.cmp(&a.count));
        bins
    }

    /// Corner coordinates of the hexagon centred on `center`.
    pub fn corners(&self, center: &GeoPoint) -> [GeoPoint; 6] {
        let (cx, cy) = self.project(center);
        std::array::from_fn(|i| {
            let angle = (60.0 * i as f64 - 30.0).to_radians();
            self.unproject(
                cx + self.radius_m * angle.cos(),
                cy + self.radius_m * angle.sin(),
            )
        })
    }

    fn project(&self, point: &GeoPoint) -> (f64, f64) {
        (
            point.longitude * self.meters_per_degree_lon,
            point.latitude * METERS_PER_DEGREE,
        )
    }

    fn unproject(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint {
            latitude: y / METERS_PER_DEGREE,
            longitude: x / self.meters_per_degree_lon,
        }
    }

    /// Axial coordinates of the hexagon containing `point`.
    fn cell_of(&self, point: &GeoPoint) -> (i64, i64) {
        let (x, y) = self.project(point);
        let q = (SQRT_3 / 3.0 * x - y / 3.0) / self.radius_m;
        let r = (2.0 / 3.0 * y) / self.radius_m;
        cube_round(q, r)
    }

    fn center_of(&self, q: i64, r: i64) -> GeoPoint {
        let (q, r) = (q as f64, r as f64);
        let x = self.radius_m * (SQRT_3 * q + SQRT_3 / 2.0 * r);
        let y = self.radius_m * 1.5 * r;
        self.unproject(x, y)
    }
}

/// Round fractional axial coordinates to the nearest hexagon.
fn cube_round(q: f64, r: f64) -> (i64, i64) {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i64, rr as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_empty_input_has_no_bins() {
        let binner = HexBinner::new(100.0, 4.0, 1000.0, 40.7);
        assert!(binner.bin(&[]).is_empty());
    }

    #[test]
    fn test_nearby_points_share_a_bin() {
        let binner = HexBinner::new(100.0, 4.0, 1000.0, 40.7);
        let p = point(40.712_3, -73.987_6);
        let center = binner.bin(&[p])[0].center;
        let bins = binner.bin(&[p, center, point(40.8, -73.95)]);

        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u32>(), 3);
    }

    #[test]
    fn test_elevation_scales_with_density() {
        let binner = HexBinner::new(100.0, 4.0, 1000.0, 40.7);
        let bins = binner.bin(&[
            point(40.7, -73.9),
            point(40.7, -73.9),
            point(40.8, -73.95),
        ]);

        assert!((bins[0].elevation - 4000.0).abs() < 1e-9);
        assert!((bins[1].elevation - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_lies_within_radius() {
        let binner = HexBinner::new(100.0, 4.0, 1000.0, 40.7);
        let p = point(40.712_3, -73.987_6);
        let bins = binner.bin(&[p]);
        let (px, py) = binner.project(&p);
        let (cx, cy) = binner.project(&bins[0].center);

        assert!(((px - cx).powi(2) + (py - cy).powi(2)).sqrt() <= 100.0 + 1e-6);
    }

    #[test]
    fn test_corners_are_radius_from_center() {
        let binner = HexBinner::new(250.0, 4.0, 1000.0, 40.7);
        let center = point(40.7, -73.9);
        let (cx, cy) = binner.project(&center);

        for corner in binner.corners(&center) {
            let (x, y) = binner.project(&corner);
            let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            assert!((d - 250.0).abs() < 1e-6);
        }
    }
}
