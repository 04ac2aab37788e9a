//! Sentinel-1 radar backscatter, one provider per polarization channel.
//!
//! Radar queries use a much larger footprint than the optical providers:
//! speckle is multiplicative noise and only averages out over a wide area.
//! Each polarization is independent; zero VV scenes null only VV.

use crate::config::EnrichConfig;
use crate::point::GeoPoint;
use crate::source::{BandSelect, CollectionFilter, Composite, RasterQuery, RasterSource, Reducer};
use crate::table::SensorReading;

use super::{run_query, year_range, SensorProvider};

pub const SENTINEL1_GRD: &str = "COPERNICUS/S1_GRD";
pub const INSTRUMENT_MODE: &str = "instrumentMode";
pub const POLARISATION_LIST: &str = "transmitterReceiverPolarisation";

pub struct RadarProvider {
    feature: &'static str,
    polarization: &'static str,
    year: i32,
    buffer_m: f64,
    scale_m: f64,
}

impl RadarProvider {
    pub fn vv(config: &EnrichConfig) -> Self {
        RadarProvider {
            feature: "Sentinel1_VV",
            polarization: "VV",
            year: config.year,
            buffer_m: config.radar_buffer_m,
            scale_m: config.radar_scale_m,
        }
    }

    pub fn vh(config: &EnrichConfig) -> Self {
        RadarProvider {
            feature: "Sentinel1_VH",
            polarization: "VH",
            year: config.year,
            buffer_m: config.radar_buffer_m,
            scale_m: config.radar_scale_m,
        }
    }

    fn query(&self, point: &GeoPoint) -> RasterQuery {
        RasterQuery {
            dataset: SENTINEL1_GRD.to_string(),
            band: BandSelect::Single(self.polarization.to_string()),
            lat: point.lat,
            lon: point.lon,
            // Never shrink below the speckle-averaging footprint, whatever
            // the point's own tolerance says.
            buffer_m: point.buffer_m.max(self.buffer_m),
            date_range: Some(year_range(self.year)),
            filters: vec![
                CollectionFilter::PropertyEquals {
                    property: INSTRUMENT_MODE.to_string(),
                    value: "IW".to_string(),
                },
                CollectionFilter::ListContains {
                    property: POLARISATION_LIST.to_string(),
                    value: self.polarization.to_string(),
                },
            ],
            composite: Composite::Median,
            reducer: Reducer::Mean,
            scale_m: self.scale_m,
        }
    }
}

impl SensorProvider for RadarProvider {
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
