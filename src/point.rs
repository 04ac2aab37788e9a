//! Input point locations and their validation.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default sampling buffer around a point, in metres.
pub const DEFAULT_BUFFER_M: f64 = 50.0;

/// A named coordinate with a spatial tolerance. Immutable once enrichment
/// begins; the engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_buffer")]
    pub buffer_m: f64,
}

fn default_buffer() -> f64 {
    DEFAULT_BUFFER_M
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PointError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeRange(f64),
    #[error("coordinate is not a finite number")]
    NonFiniteCoordinate,
    #[error("buffer {0} m is negative")]
    NegativeBuffer(f64),
}

impl GeoPoint {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        GeoPoint {
            name: name.into(),
            lat,
            lon,
            buffer_m: DEFAULT_BUFFER_M,
        }
    }

    pub fn with_buffer(mut self, buffer_m: f64) -> Self {
        self.buffer_m = buffer_m;
        self
    }

    /// Checks producer-side contract violations before any network call.
    pub fn validate(&self) -> Result<(), PointError> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(PointError::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(PointError::LatitudeRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(PointError::LongitudeRange(self.lon));
        }
        if self.buffer_m < 0.0 {
            return Err(PointError::NegativeBuffer(self.buffer_m));
        }
        Ok(())
    }
}

/// Loads a point list from a `name,lat,lon[,buffer_m]` CSV file.
pub fn load_points(path: &Path) -> Result<Vec<GeoPoint>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening point list `{}`", path.display()))?;
    points_from_reader(file).with_context(|| format!("reading point list `{}`", path.display()))
}

pub fn points_from_reader<R: Read>(reader: R) -> Result<Vec<GeoPoint>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for row in csv_reader.deserialize() {
        let point: GeoPoint = row.context("deserialising point row")?;
        points.push(point);
    }

    Ok(points)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_valid_point() {
        let point = GeoPoint::new("Tequinho", -9.8951, -67.5442);
        assert!(point.validate().is_ok());
        assert_eq!(point.buffer_m, 50.0);
    }

    #[test]
    fn should_reject_out_of_range_latitude() {
        let point = GeoPoint::new("bad", 91.0, 0.0);
        assert_eq!(point.validate(), Err(PointError::LatitudeRange(91.0)));
    }

    #[test]
    fn should_reject_out_of_range_longitude() {
        let point = GeoPoint::new("bad", 0.0, -180.5);
        assert_eq!(point.validate(), Err(PointError::LongitudeRange(-180.5)));
    }

    #[test]
    fn should_reject_non_finite_coordinate() {
        let point = GeoPoint::new("bad", f64::NAN, 0.0);
        assert_eq!(point.validate(), Err(PointError::NonFiniteCoordinate));
    }

    #[test]
    fn should_reject_negative_buffer() {
        let point = GeoPoint::new("bad", 0.0, 0.0).with_buffer(-1.0);
        assert_eq!(point.validate(), Err(PointError::NegativeBuffer(-1.0)));
    }

    #[test]
    fn should_load_points_from_csv() {
        let csv = "name,lat,lon,buffer_m\nSol de Maio,-9.9261,-67.2855,100\n";
        let points = points_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "Sol de Maio");
        assert_eq!(points[0].lat, -9.9261);
        assert_eq!(points[0].buffer_m, 100.0);
    }

    #[test]
    fn should_default_buffer_when_column_missing() {
        let csv = "name,lat,lon\nFazenda Colorada,-9.8731,-67.5239\n";
        let points = points_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(points[0].buffer_m, DEFAULT_BUFFER_M);
    }

    #[test]
    fn should_ignore_extra_columns() {
        let csv = "name,lat,lon,rationale\nIgarape,0.1,-67.0,remote headwater\n";
        let points = points_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(points[0].name, "Igarape");
        assert_eq!(points[0].lon, -67.0);
    }
}
