//! Canopy height: high-resolution GEDI pulses first, the coarse 2005
//! global raster when GEDI has nothing usable. A GEDI height of exactly
//! zero means "no return over this footprint", not a zero-metre canopy,
//! so by default it is rejected and handed to the fallback.

use crate::config::EnrichConfig;
use crate::point::GeoPoint;
use crate::source::{BandSelect, Composite, RasterQuery, RasterSource, Reducer};
use crate::table::SensorReading;

use super::{run_query, FallbackResolver, SensorProvider};

pub const GEDI_MONTHLY: &str = "LARSE/GEDI/GEDI02_A_002_MONTHLY";
pub const GLOBAL_CANOPY_2005: &str = "NASA/JPL/global_forest_canopy_height_2005";
pub const CANOPY_FEATURE: &str = "CanopyHeight";

pub enum CanopyProvider {
    Gedi { scale_m: f64, zero_invalid: bool },
    Global { scale_m: f64 },
}

impl CanopyProvider {
    fn query(&self, point: &GeoPoint) -> RasterQuery {
        match self {
            CanopyProvider::Gedi { scale_m, .. } => RasterQuery {
                dataset: GEDI_MONTHLY.to_string(),
                band: BandSelect::Single("rh98".to_string()),
                lat: point.lat,
                lon: point.lon,
                buffer_m: point.buffer_m,
                date_range: None,
                filters: Vec::new(),
                composite: Composite::Median,
                reducer: Reducer::Mean,
                scale_m: *scale_m,
            },
            CanopyProvider::Global { scale_m } => RasterQuery {
                dataset: GLOBAL_CANOPY_2005.to_string(),
                band: BandSelect::Single("1".to_string()),
                lat: point.lat,
                lon: point.lon,
                buffer_m: point.buffer_m,
                date_range: None,
                filters: Vec::new(),
                composite: Composite::None,
                reducer: Reducer::Mean,
                scale_m: *scale_m,
            },
        }
    }
}

impl SensorProvider for CanopyProvider {
    fn feature_name(&self) -> &'static str {
        CANOPY_FEATURE
    }

    fn accepts(&self, value: f64) -> bool {
        match self {
            CanopyProvider::Gedi { zero_invalid, .. } => !(*zero_invalid && value == 0.0),
            CanopyProvider::Global { .. } => true,
        }
    }

    async fn fetch<S: RasterSource>(&self, source: &S, point: &GeoPoint) -> SensorReading {
        run_query(CANOPY_FEATURE, source, point, &self.query(point)).await
    }
}

/// The configured canopy chain: GEDI, then the global raster.
pub fn canopy_chain(config: &EnrichConfig) -> FallbackResolver<CanopyProvider> {
    FallbackResolver::new(vec![
        CanopyProvider::Gedi {
            scale_m: config.gedi_scale_m,
            zero_invalid: config.canopy_zero_invalid,
        },
        CanopyProvider::Global {
            scale_m: config.canopy_fallback_scale_m,
        },
    ])
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::stub::StubSource;

    const GEDI_KEY: &str = "LARSE/GEDI/GEDI02_A_002_MONTHLY:rh98";
    const GLOBAL_KEY: &str = "NASA/JPL/global_forest_canopy_height_2005:1";

    fn point() -> GeoPoint {
        GeoPoint::new("canopy", -3.1, -64.8)
    }

    #[tokio::test]
    async fn should_prefer_gedi_without_touching_fallback() {
        let source = StubSource::new()
            .with_value(GEDI_KEY, 27.3)
            .with_value(GLOBAL_KEY, 19.0);
        let chain = canopy_chain(&EnrichConfig::default());

        let reading = chain.resolve(&source, &point()).await;

        assert_eq!(reading.value, Some(27.3));
        assert_eq!(source.calls_for(GEDI_KEY), 1);
        assert_eq!(source.calls_for(GLOBAL_KEY), 0);
    }

    #[tokio::test]
    async fn should_treat_zero_gedi_height_as_invalid() {
        let source = StubSource::new()
            .with_value(GEDI_KEY, 0.0)
            .with_value(GLOBAL_KEY, 19.0);
        let chain = canopy_chain(&EnrichConfig::default());

        let reading = chain.resolve(&source, &point()).await;

        assert_eq!(reading.value, Some(19.0));
        assert_eq!(source.calls_for(GLOBAL_KEY), 1);
    }

    #[tokio::test]
    async fn should_accept_zero_when_configured_valid() {
        let config = EnrichConfig {
            canopy_zero_invalid: false,
            ..EnrichConfig::default()
        };
        let source = StubSource::new()
            .with_value(GEDI_KEY, 0.0)
            .with_value(GLOBAL_KEY, 19.0);

        let reading = canopy_chain(&config).resolve(&source, &point()).await;

        assert_eq!(reading.value, Some(0.0));
        assert_eq!(source.calls_for(GLOBAL_KEY), 0);
    }

    #[tokio::test]
    async fn should_fall_back_when_gedi_has_no_pulses() {
        let source = StubSource::new()
            .with_empty(GEDI_KEY)
            .with_value(GLOBAL_KEY, 21.5);

        let reading = canopy_chain(&EnrichConfig::default())
            .resolve(&source, &point())
            .await;

        assert_eq!(reading.value, Some(21.5));
    }

    #[tokio::test]
    async fn should_return_null_when_both_sources_empty() {
        let source = StubSource::new().with_empty(GEDI_KEY).with_empty(GLOBAL_KEY);

        let reading = canopy_chain(&EnrichConfig::default())
            .resolve(&source, &point())
            .await;

        assert_eq!(reading.value, None);
        assert_eq!(reading.feature, CANOPY_FEATURE);
    }

    #[test]
    fn should_use_coarse_scale_for_fallback() {
        let config = EnrichConfig::default();
        let chain = canopy_chain(&config);

        let gedi = chain.providers[0].query(&point());
        let global = chain.providers[1].query(&point());

        assert_eq!(gedi.scale_m, 25.0);
        assert_eq!(global.scale_m, 1000.0);
    }
}
