//! Orchestrates an enrichment run: every configured provider, for every
//! point, in input order, with pacing between points.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use thiserror::Error;

use crate::config::EnrichConfig;
use crate::point::{GeoPoint, PointError};
use crate::provider::ProviderSet;
use crate::source::RasterSource;
use crate::table::{FeatureRecord, FeatureSchema, FeatureTable, SchemaError};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("invalid input point `{name}`: {source}")]
    InvalidPoint {
        name: String,
        #[source]
        source: PointError,
    },
    #[error("{0}")]
    Schema(#[from] SchemaError),
    #[error("enrichment produced {got} rows for {expected} points; missing: {}", .missing.join(", "))]
    CountMismatch {
        expected: usize,
        got: usize,
        missing: Vec<String>,
    },
    #[error("enrichment cancelled after {} of {expected} points", .partial.len())]
    Cancelled {
        /// Rows assembled before cancellation; a valid partial artifact.
        partial: FeatureTable,
        expected: usize,
    },
}

pub struct EnrichmentEngine<S: RasterSource> {
    source: S,
    providers: ProviderSet,
    config: EnrichConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: RasterSource> EnrichmentEngine<S> {
    pub fn new(source: S, config: EnrichConfig) -> Self {
        EnrichmentEngine {
            providers: ProviderSet::from_config(&config),
            source,
            config,
            cancel: None,
        }
    }

    /// Installs a cooperative cancellation flag; when set, the remaining
    /// queue is abandoned and completed rows are handed back.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn schema(&self) -> FeatureSchema {
        self.providers.schema()
    }

    pub async fn enrich(&self, points: &[GeoPoint]) -> Result<FeatureTable, EnrichError> {
        self.run(points, None).await
    }

    pub async fn enrich_with_progress(
        &self,
        points: &[GeoPoint],
        progress: &ProgressBar,
    ) -> Result<FeatureTable, EnrichError> {
        self.run(points, Some(progress)).await
    }

    async fn run(
        &self,
        points: &[GeoPoint],
        progress: Option<&ProgressBar>,
    ) -> Result<FeatureTable, EnrichError> {
        // Producer-side contract violations are fatal before any network
        // call is attempted.
        for point in points {
            point.validate().map_err(|source| EnrichError::InvalidPoint {
                name: point.name.clone(),
                source,
            })?;
        }

        let schema = self.providers.schema();
        let mut records = Vec::with_capacity(points.len());

        for (index, point) in points.iter().enumerate() {
            if self.is_cancelled() {
                tracing::warn!(done = records.len(), total = points.len(), "run cancelled");
                let partial = FeatureTable::new(schema, records)?;
                return Err(EnrichError::Cancelled {
                    partial,
                    expected: points.len(),
                });
            }

            tracing::info!(point = %point.name, lat = point.lat, lon = point.lon, "enriching");
            let mut readings = self.providers.fetch_point(&self.source, point).await;

            // Degenerate reductions can come back as +/-inf; downstream
            // statistics must never see a non-finite value.
            for reading in &mut readings {
                if let Some(value) = reading.value {
                    if !value.is_finite() {
                        tracing::warn!(
                            point = %point.name,
                            feature = %reading.feature,
                            value,
                            "non-finite value sanitised to null"
                        );
                        reading.value = None;
                        reading.source_id = None;
                    }
                }
            }

            records.push(FeatureRecord::new(point.clone(), readings));

            if let Some(bar) = progress {
                bar.inc(1);
            }
            if index + 1 < points.len() && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        let table = FeatureTable::new(schema, records)?;

        // Checked, not assumed: a short table silently corrupts downstream
        // comparison joins.
        if table.len() != points.len() {
            let produced: HashSet<&str> =
                table.records().iter().map(|r| r.point().name.as_str()).collect();
            let missing = points
                .iter()
                .filter(|p| !produced.contains(p.name.as_str()))
                .map(|p| p.name.clone())
                .collect();
            return Err(EnrichError::CountMismatch {
                expected: points.len(),
                got: table.len(),
                missing,
            });
        }

        Ok(table)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

// -- Tests -------------------------------------------------------------------
