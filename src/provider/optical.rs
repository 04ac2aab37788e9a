//! Optical normalized-difference indices over Sentinel-2 surface
//! reflectance: NDVI (vegetation), NDWI (water), NDBI (built-up).

use crate::config::EnrichConfig;
use crate::point::GeoPoint;
use crate::source::{BandSelect, CollectionFilter, Composite, RasterQuery, RasterSource, Reducer};
use crate::table::SensorReading;

use super::{run_query, year_range, SensorProvider};

pub const SENTINEL2_SR: &str = "COPERNICUS/S2_SR_HARMONIZED";
pub const CLOUD_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";

pub struct OpticalIndexProvider {
    feature: &'static str,
    band_a: &'static str,
    band_b: &'static str,
    year: i32,
    cloud_fraction_max: f64,
    composite: Composite,
    buffer_min_m: f64,
    scale_m: f64,
}

impl OpticalIndexProvider {
    fn index(feature: &'static str, band_a: &'static str, band_b: &'static str, config: &EnrichConfig) -> Self {
        OpticalIndexProvider {
            feature,
            band_a,
            band_b,
            year: config.year,
            cloud_fraction_max: config.cloud_fraction_max,
            composite: config.optical_composite,
            buffer_min_m: config.optical_buffer_min_m,
            scale_m: config.optical_scale_m,
        }
    }

    pub fn ndvi(config: &EnrichConfig) -> Self {
        Self::index("NDVI", "B8", "B4", config)
    }

    pub fn ndwi(config: &EnrichConfig) -> Self {
        Self::index("NDWI", "B3", "B8", config)
    }

    pub fn ndbi(config: &EnrichConfig) -> Self {
        Self::index("NDBI", "B11", "B8", config)
    }

    pub(crate) fn query(&self, point: &GeoPoint) -> RasterQuery {
        RasterQuery {
            dataset: SENTINEL2_SR.to_string(),
            band: BandSelect::NormalizedDifference(self.band_a.to_string(), self.band_b.to_string()),
            lat: point.lat,
            lon: point.lon,
            // The point's own tolerance, but never below the optical
            // sampling footprint.
            buffer_m: point.buffer_m.max(self.buffer_min_m),
            date_range: Some(year_range(self.year)),
            filters: vec![CollectionFilter::CloudFractionMax(self.cloud_fraction_max)],
            composite: self.composite,
            reducer: Reducer::Mean,
            scale_m: self.scale_m,
        }
    }
}

impl SensorProvider for OpticalIndexProvider {
    fn feature_name(&self) -> &'static str {
        self.feature
    }

    fn scene_based(&self) -> bool {
        true
    }

    async fn fetch<S: RasterSource>(&self, source: &S, point: &GeoPoint) -> SensorReading {
        run_query(self.feature, source, point, &self.query(point)).await
    }
}

// -- Tests -------------------------------------------------------------------
