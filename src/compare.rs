//! Statistical comparison of a candidate table against a benchmark table:
//! z-score profiles over the features observed in both, with candidate
//! coverage reported per feature.

use thiserror::Error;

use crate::table::FeatureTable;

/// One retained feature's comparison row. Profile entries are `None` when
/// the benchmark has too few observations (or zero spread) to standardize.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureProfile {
    pub feature: String,
    /// Fraction of candidate points with a non-null value.
    pub coverage: f64,
    pub benchmark_z: Option<f64>,
    pub candidate_z: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub profiles: Vec<FeatureProfile>,
}

impl ComparisonReport {
    pub fn features(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.feature.as_str()).collect()
    }

    pub fn benchmark_profile(&self) -> Vec<Option<f64>> {
        self.profiles.iter().map(|p| p.benchmark_z).collect()
    }

    pub fn candidate_profile(&self) -> Vec<Option<f64>> {
        self.profiles.iter().map(|p| p.candidate_z).collect()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("benchmark and candidate tables have different feature schemas")]
    SchemaMismatch,
    #[error("{0} table is empty")]
    EmptyTable(&'static str),
    #[error("no feature has observations in both tables")]
    NoSharedFeatures,
}

/// Candidates are standardized against *benchmark* statistics, not their
/// own: the question is how candidate sites sit within the distribution of
/// the known reference sites.
pub fn compare(
    benchmark: &FeatureTable,
    candidates: &FeatureTable,
) -> Result<ComparisonReport, CompareError> {
    if benchmark.is_empty() {
        return Err(CompareError::EmptyTable("benchmark"));
    }
    if candidates.is_empty() {
        return Err(CompareError::EmptyTable("candidate"));
    }

    let benchmark_names: Vec<&str> = benchmark.schema().names().collect();
    let candidate_names: Vec<&str> = candidates.schema().names().collect();
    if benchmark_names != candidate_names {
        return Err(CompareError::SchemaMismatch);
    }

    let mut profiles = Vec::new();

    for feature in benchmark_names {
        let bench_col = benchmark.column(feature);
        let cand_col = candidates.column(feature);

        // A feature that is all-null in either table cannot be compared.
        let bench_observed = bench_col.iter().any(Option::is_some);
        let cand_observed = cand_col.iter().any(Option::is_some);
        if !bench_observed || !cand_observed {
            tracing::debug!(feature, "excluded from profile: all-null in one table");
            continue;
        }

        let coverage = cand_col.iter().filter(|v| v.is_some()).count() as f64
            / cand_col.len() as f64;

        let (benchmark_z, candidate_z) = match benchmark_stats(&bench_col) {
            Some((mean, std)) => (
                standardized_mean(&bench_col, mean, std),
                standardized_mean(&cand_col, mean, std),
            ),
            None => (None, None),
        };

        profiles.push(FeatureProfile {
            feature: feature.to_string(),
            coverage,
            benchmark_z,
            candidate_z,
        });
    }

    if profiles.is_empty() {
        return Err(CompareError::NoSharedFeatures);
    }

    Ok(ComparisonReport { profiles })
}

/// Mean and sample standard deviation of the non-null benchmark values.
/// `None` when fewer than two observations exist or the spread is zero.
fn benchmark_stats(column: &[Option<f64>]) -> Option<(f64, f64)> {
    let values: Vec<f64> = column.iter().flatten().copied().collect();
    if values.len() < 2 {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    let std = variance.sqrt();

    if std == 0.0 || !std.is_finite() {
        return None;
    }

    Some((mean, std))
}

/// Per-feature mean of z-scores over the non-null values of a column.
fn standardized_mean(column: &[Option<f64>], mean: f64, std: f64) -> Option<f64> {
    let scores: Vec<f64> = column
        .iter()
        .flatten()
        .map(|v| (v - mean) / std)
        .collect();
    if scores.is_empty() {
        return None;
    }

    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

// -- Tests -------------------------------------------------------------------
