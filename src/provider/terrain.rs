//! Elevation and slope from the static SRTM terrain model. Slope is the
//! upstream surface-gradient product derived from the same elevation band.

use crate::config::EnrichConfig;
use crate::point::GeoPoint;
use crate::source::{BandSelect, Composite, RasterQuery, RasterSource, Reducer};
use crate::table::SensorReading;

use super::{run_query, SensorProvider};

pub const SRTM: &str = "USGS/SRTMGL1_003";

pub struct TerrainProvider {
    feature: &'static str,
    band: &'static str,
    buffer_min_m: f64,
    scale_m: f64,
}

impl TerrainProvider {
    pub fn elevation(config: &EnrichConfig) -> Self {
        TerrainProvider {
            feature: "Elevation",
            band: "elevation",
            buffer_min_m: config.optical_buffer_min_m,
            scale_m: config.terrain_scale_m,
        }
    }

    pub fn slope(config: &EnrichConfig) -> Self {
        TerrainProvider {
            feature: "Slope",
            band: "slope",
            buffer_min_m: config.optical_buffer_min_m,
            scale_m: config.terrain_scale_m,
        }
    }

    fn query(&self, point: &GeoPoint) -> RasterQuery {
        RasterQuery {
            dataset: SRTM.to_string(),
            band: BandSelect::Single(self.band.to_string()),
            lat: point.lat,
            lon: point.lon,
            buffer_m: point.buffer_m.max(self.buffer_min_m),
            date_range: None,
            filters: Vec::new(),
            composite: Composite::None,
            reducer: Reducer::Mean,
            scale_m: self.scale_m,
        }
    }
}

impl SensorProvider for TerrainProvider {
    fn feature_name(&self) -> &'static str {
        self.feature
    }

    async fn fetch<S: RasterSource>(&self, source: &S, point: &GeoPoint) -> SensorReading {
        run_query(self.feature, source, point, &self.query(point)).await
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_query_static_model_without_dates() {
        let provider = TerrainProvider::elevation(&EnrichConfig::default());
        let query = provider.query(&GeoPoint::new("p", -9.9, -67.5));

        assert_eq!(query.dataset, SRTM);
        assert_eq!(query.band, BandSelect::Single("elevation".to_string()));
        assert_eq!(query.date_range, None);
        assert_eq!(query.composite, Composite::None);
        assert_eq!(query.scale_m, 30.0);
    }

    #[test]
    fn should_request_derived_slope_band() {
        let provider = TerrainProvider::slope(&EnrichConfig::default());
        let query = provider.query(&GeoPoint::new("p", 0.0, 0.0));

        assert_eq!(provider.feature_name(), "Slope");
        assert_eq!(query.band, BandSelect::Single("slope".to_string()));
    }
}
