//! Ask the oracle for a site list and save it as a point CSV.

use anyhow::Result;

use crate::cli::create_spinner;
use crate::oracle::{SiteOracle, BENCHMARK_PROMPT, CANDIDATE_PROMPT};
use crate::point::DEFAULT_BUFFER_M;

use super::make_output_file_name;

pub async fn suggest(candidates: bool, model: &str) -> Result<String> {
    let oracle = SiteOracle::from_env(model)?;
    let (prompt, stem) = if candidates {
        (CANDIDATE_PROMPT, "candidates")
    } else {
        (BENCHMARK_PROMPT, "benchmarks")
    };

    let bar = create_spinner("Consulting site oracle...".to_string());
    let sites = oracle.suggest_sites(prompt).await?;
    bar.finish_with_message(format!("Oracle suggested {} sites", sites.len()));

    for site in &sites {
        match &site.rationale {
            Some(rationale) => println!("{} ({}, {}): {}", site.name, site.lat, site.lon, rationale),
            None => println!("{} ({}, {})", site.name, site.lat, site.lon),
        }
    }

    let path = make_output_file_name(stem, "csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["name", "lat", "lon", "buffer_m", "rationale"])?;
    for site in &sites {
        writer.write_record([
            site.name.clone(),
            site.lat.to_string(),
            site.lon.to_string(),
            DEFAULT_BUFFER_M.to_string(),
            site.rationale.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    Ok(path.to_string_lossy().to_string())
}
