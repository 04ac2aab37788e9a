//! Sensor providers: one per upstream dataset, all speaking the same
//! fetch-and-reduce contract, plus the fallback chain for layered sources.

pub mod canopy;
pub mod landcover;
pub mod optical;
pub mod radar;
pub mod terrain;

pub use canopy::CanopyProvider;
pub use landcover::LandCoverProvider;
pub use optical::OpticalIndexProvider;
pub use radar::RadarProvider;
pub use terrain::TerrainProvider;

use crate::config::EnrichConfig;
use crate::point::GeoPoint;
use crate::source::{RasterQuery, RasterSource};
use crate::table::{FeatureSchema, FeatureSpec, SensorReading};

#[allow(async_fn_in_trait)]
pub trait SensorProvider {
    fn feature_name(&self) -> &'static str;

    fn scene_based(&self) -> bool {
        false
    }

    /// Whether a fetched value is usable. Consulted by `FallbackResolver`
    /// before a reading is accepted.
    fn accepts(&self, _value: f64) -> bool {
        true
    }

    /// Fetches one reading. "No data" and upstream failures both come back
    /// as a null reading, never as an error.
    async fn fetch<S: RasterSource>(&self, source: &S, point: &GeoPoint) -> SensorReading;
}

/// Runs a query and maps both the empty-collection outcome and upstream
/// failures to a null reading, logging the cause with point and feature.
pub(crate) async fn run_query<S: RasterSource>(
    feature: &'static str,
    source: &S,
    point: &GeoPoint,
    query: &RasterQuery,
) -> SensorReading {
    match source.reduce(query).await {
        Ok(result) => {
            if result.value.is_none() {
                tracing::debug!(
                    point = %point.name,
                    feature,
                    scenes = result.scene_count,
                    "no usable observation"
                );
            }
            SensorReading::new(feature, result.value, result.scene_id)
        }
        Err(err) => {
            tracing::warn!(
                point = %point.name,
                feature,
                error = %err,
                "upstream query failed, recording null"
            );
            SensorReading::null(feature)
        }
    }
}

pub(crate) fn year_range(year: i32) -> (String, String) {
    (format!("{year}-01-01"), format!("{year}-12-31"))
}

/// An ordered chain of providers for one feature. Providers are invoked
/// lazily: the first reading that passes its own provider's acceptance
/// predicate wins and later providers are never called.
pub struct FallbackResolver<P> {
    pub(crate) providers: Vec<P>,
}

impl<P: SensorProvider> FallbackResolver<P> {
    /// The chain must be non-empty and share one feature name.
    pub fn new(providers: Vec<P>) -> Self {
        assert!(!providers.is_empty(), "fallback chain cannot be empty");
        FallbackResolver { providers }
    }

    pub fn feature_name(&self) -> &'static str {
        self.providers[0].feature_name()
    }

    pub async fn resolve<S: RasterSource>(&self, source: &S, point: &GeoPoint) -> SensorReading {
        for (step, provider) in self.providers.iter().enumerate() {
            let reading = provider.fetch(source, point).await;
            match reading.value {
                Some(value) if provider.accepts(value) => {
                    if step > 0 {
                        tracing::debug!(
                            point = %point.name,
                            feature = %reading.feature,
                            step,
                            "fallback provider supplied value"
                        );
                    }
                    return reading;
                }
                Some(value) => {
                    tracing::debug!(
                        point = %point.name,
                        feature = %reading.feature,
                        value,
                        "value rejected, trying next provider"
                    );
                }
                None => {}
            }
        }

        tracing::warn!(
            point = %point.name,
            feature = self.feature_name(),
            "all providers exhausted, recording null"
        );
        SensorReading::null(self.feature_name())
    }
}

/// The full configured provider set, invoked in a fixed order per point so
/// the output column ordering is deterministic.
pub struct ProviderSet {
    ndvi: OpticalIndexProvider,
    ndwi: OpticalIndexProvider,
    ndbi: OpticalIndexProvider,
    elevation: TerrainProvider,
    slope: TerrainProvider,
    radar_vv: RadarProvider,
    radar_vh: RadarProvider,
    landcover: LandCoverProvider,
    canopy: FallbackResolver<CanopyProvider>,
}

impl ProviderSet {
    pub fn from_config(config: &EnrichConfig) -> Self {
        ProviderSet {
            ndvi: OpticalIndexProvider::ndvi(config),
            ndwi: OpticalIndexProvider::ndwi(config),
            ndbi: OpticalIndexProvider::ndbi(config),
            elevation: TerrainProvider::elevation(config),
            slope: TerrainProvider::slope(config),
            radar_vv: RadarProvider::vv(config),
            radar_vh: RadarProvider::vh(config),
            landcover: LandCoverProvider::from_config(config),
            canopy: canopy::canopy_chain(config),
        }
    }

    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(vec![
            FeatureSpec::new(self.ndvi.feature_name(), self.ndvi.scene_based()),
            FeatureSpec::new(self.ndwi.feature_name(), self.ndwi.scene_based()),
            FeatureSpec::new(self.ndbi.feature_name(), self.ndbi.scene_based()),
            FeatureSpec::new(self.elevation.feature_name(), self.elevation.scene_based()),
            FeatureSpec::new(self.slope.feature_name(), self.slope.scene_based()),
            FeatureSpec::new(self.radar_vv.feature_name(), self.radar_vv.scene_based()),
            FeatureSpec::new(self.radar_vh.feature_name(), self.radar_vh.scene_based()),
            FeatureSpec::new(self.landcover.feature_name(), self.landcover.scene_based()),
            FeatureSpec::new(self.canopy.feature_name(), false),
        ])
    }

    /// Fetches every feature for one point. The network calls share no
    /// mutable state, so they are issued concurrently; the result order
    /// matches `schema()`.
    pub async fn fetch_point<S: RasterSource>(
        &self,
        source: &S,
        point: &GeoPoint,
    ) -> Vec<SensorReading> {
        let (ndvi, ndwi, ndbi, elevation, slope, vv, vh, landcover, canopy) = futures::join!(
            self.ndvi.fetch(source, point),
            self.ndwi.fetch(source, point),
            self.ndbi.fetch(source, point),
            self.elevation.fetch(source, point),
            self.slope.fetch(source, point),
            self.radar_vv.fetch(source, point),
            self.radar_vh.fetch(source, point),
            self.landcover.fetch(source, point),
            self.canopy.resolve(source, point),
        );

        vec![ndvi, ndwi, ndbi, elevation, slope, vv, vh, landcover, canopy]
    }
}

// -- Tests -------------------------------------------------------------------
