//! Ask the oracle which enriched candidates match the benchmark sites.

use std::path::Path;

use anyhow::Result;

use crate::cli::create_spinner;
use crate::export;
use crate::oracle::{MatchJudgment, SiteOracle};

use super::make_output_file_name;

pub async fn analyze(benchmark_path: &Path, candidates_path: &Path, model: &str) -> Result<String> {
    let benchmark = export::load_csv(benchmark_path)?;
    let candidates = export::load_csv(candidates_path)?;
    println!(
        "Judging {} candidates against {} benchmark sites",
        candidates.len(),
        benchmark.len()
    );

    let oracle = SiteOracle::from_env(model)?;
    let bar = create_spinner("Consulting match oracle...".to_string());
    let matches = oracle.judge_matches(&benchmark, &candidates).await?;
    bar.finish_with_message(format!("Oracle judged {} close matches", matches.len()));

    if matches.is_empty() {
        println!("No candidate judged a close match");
    }
    for judgment in &matches {
        println!(
            "{} ({}, {}): {}",
            judgment.name, judgment.lat, judgment.lon, judgment.reason
        );
    }

    let path = make_output_file_name("matches", "csv");
    save_matches_csv(&matches, &path)?;

    Ok(path.to_string_lossy().to_string())
}

fn save_matches_csv(matches: &[MatchJudgment], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["name", "lat", "lon", "reason"])?;
    for judgment in matches {
        writer.write_record([
            judgment.name.clone(),
            judgment.lat.to_string(),
            judgment.lon.to_string(),
            judgment.reason.clone(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_save_match_judgments_as_csv() {
        let matches = vec![MatchJudgment {
            name: "Cerro Oculto".to_string(),
            lat: 0.92,
            lon: -66.71,
            reason: "close to benchmark means".to_string(),
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matches.csv");

        save_matches_csv(&matches, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.lines().next().unwrap(),
            "name,lat,lon,reason"
        );
        assert_eq!(
            contents.lines().nth(1).unwrap(),
            "Cerro Oculto,0.92,-66.71,close to benchmark means"
        );
    }

    #[test]
    fn should_save_header_only_csv_for_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matches.csv");

        save_matches_csv(&[], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "name,lat,lon,reason");
    }
}
