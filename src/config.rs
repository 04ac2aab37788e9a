//! Enrichment run configuration.
//!
//! All sampling constants are explicit here rather than scattered through
//! the providers, so a run can be reproduced from its configuration alone.

use std::time::Duration;

use crate::source::Composite;

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Acquisition year for scene-based collections.
    pub year: i32,
    /// Maximum cloudy-pixel percentage accepted for optical scenes.
    pub cloud_fraction_max: f64,
    /// Optical composite method. Median is robust; least-cloudy keeps a
    /// single scene and therefore a provenance id.
    pub optical_composite: Composite,
    /// Reduction scale for optical indices, metres.
    pub optical_scale_m: f64,
    /// Minimum sampling footprint for optical and terrain queries, metres.
    pub optical_buffer_min_m: f64,
    /// Reduction scale for the terrain model, metres.
    pub terrain_scale_m: f64,
    /// Reduction scale for radar backscatter, metres.
    pub radar_scale_m: f64,
    /// Radar sampling footprint, metres. Deliberately much larger than the
    /// optical footprint so spatial averaging suppresses speckle.
    pub radar_buffer_m: f64,
    /// Band year of the land-cover classification raster.
    pub landcover_year: i32,
    /// Reduction scale for the land-cover raster, metres.
    pub landcover_scale_m: f64,
    /// Reduction scale for GEDI canopy pulses, metres.
    pub gedi_scale_m: f64,
    /// Whether a GEDI height of exactly zero is treated as invalid and
    /// handed to the fallback source.
    pub canopy_zero_invalid: bool,
    /// Reduction scale for the global canopy fallback raster, metres.
    pub canopy_fallback_scale_m: f64,
    /// Delay between points, to stay inside upstream quota.
    pub pacing: Duration,
    /// Per-request network timeout.
    pub request_timeout: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        EnrichConfig {
            year: 2023,
            cloud_fraction_max: 10.0,
            optical_composite: Composite::Median,
            optical_scale_m: 10.0,
            optical_buffer_min_m: 50.0,
            terrain_scale_m: 30.0,
            radar_scale_m: 30.0,
            radar_buffer_m: 1000.0,
            landcover_year: 2020,
            landcover_scale_m: 30.0,
            gedi_scale_m: 25.0,
            canopy_zero_invalid: true,
            canopy_fallback_scale_m: 1000.0,
            pacing: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EnrichConfig {
    /// Configuration for tests: no pacing delay.
    #[cfg(test)]
    pub fn unpaced() -> Self {
        EnrichConfig {
            pacing: Duration::ZERO,
            ..EnrichConfig::default()
        }
    }
}
