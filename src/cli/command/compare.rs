//! Compare two enriched tables and print the z-score profiles.

use std::path::Path;

use anyhow::Result;

use crate::compare;
use crate::export;

use super::make_output_file_name;

pub async fn compare(benchmark_path: &Path, candidates_path: &Path) -> Result<String> {
    let benchmark = export::load_csv(benchmark_path)?;
    let candidates = export::load_csv(candidates_path)?;

    let report = compare::compare(&benchmark, &candidates)?;

    println!(
        "{:<16} {:>9} {:>12} {:>12}",
        "feature", "coverage", "benchmark_z", "candidate_z"
    );
    for profile in &report.profiles {
        println!(
            "{:<16} {:>9.2} {:>12} {:>12}",
            profile.feature,
            profile.coverage,
            format_z(profile.benchmark_z),
            format_z(profile.candidate_z),
        );
    }

    let path = make_output_file_name("profile", "csv");
    export::save_profile_csv(&report, &path)?;

    Ok(path.to_string_lossy().to_string())
}

fn format_z(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "-".to_string(),
    }
}

// -- Tests -------------------------------------------------------------------
