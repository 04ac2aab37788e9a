//! Land-cover class from the MapBiomas pan-Amazon categorical raster.
//! Categorical data reduces by mode, never mean.

use crate::config::EnrichConfig;
use crate::point::GeoPoint;
use crate::source::{BandSelect, Composite, RasterQuery, RasterSource, Reducer};
use crate::table::SensorReading;

use super::{run_query, SensorProvider};

pub const MAPBIOMAS: &str =
    "projects/mapbiomas-raisg/public/collection3/mapbiomas_raisg_panamazonia_collection3_integration_v2";

pub struct LandCoverProvider {
    year: i32,
    scale_m: f64,
}

impl LandCoverProvider {
    pub fn from_config(config: &EnrichConfig) -> Self {
        LandCoverProvider {
            year: config.landcover_year,
            scale_m: config.landcover_scale_m,
        }
    }

    fn query(&self, point: &GeoPoint) -> RasterQuery {
        RasterQuery {
            dataset: MAPBIOMAS.to_string(),
            band: BandSelect::Single(format!("classification_{}", self.year)),
            lat: point.lat,
            lon: point.lon,
            buffer_m: point.buffer_m,
            date_range: None,
            filters: Vec::new(),
            composite: Composite::None,
            reducer: Reducer::Mode,
            scale_m: self.scale_m,
        }
    }
}

impl SensorProvider for LandCoverProvider {
    fn feature_name(&self) -> &'static str {
        "MapBiomas_Class"
    }

    async fn fetch<S: RasterSource>(&self, source: &S, point: &GeoPoint) -> SensorReading {
        run_query(self.feature_name(), source, point, &self.query(point)).await
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_select_classification_year_band() {
        let provider = LandCoverProvider::from_config(&EnrichConfig::default());
        let query = provider.query(&GeoPoint::new("p", -9.9, -67.5));

        assert_eq!(query.dataset, MAPBIOMAS);
        assert_eq!(
            query.band,
            BandSelect::Single("classification_2020".to_string())
        );
    }

    #[test]
    fn should_reduce_by_mode() {
        let provider = LandCoverProvider::from_config(&EnrichConfig::default());
        let query = provider.query(&GeoPoint::new("p", 0.0, 0.0));

        assert_eq!(query.reducer, Reducer::Mode);
        assert_eq!(query.scale_m, 30.0);
    }
}
