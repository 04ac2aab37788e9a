//! Enrich a point-list CSV with every configured sensor feature.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::cli::create_progress_bar;
use crate::config::EnrichConfig;
use crate::engine::{EnrichError, EnrichmentEngine};
use crate::export;
use crate::point;
use crate::source::HttpRasterSource;

use super::make_output_file_name;

const GATEWAY_KEY_VAR: &str = "RASTER_GATEWAY_KEY";

#[derive(Args)]
pub struct EnrichArgs {
    /// Input point list (name,lat,lon[,buffer_m])
    pub input: PathBuf,

    /// Raster gateway base URL
    #[arg(long)]
    pub gateway: String,

    /// Acquisition year for scene-based collections
    #[arg(long, default_value_t = 2023)]
    pub year: i32,

    /// Maximum cloudy-pixel percentage for optical scenes
    #[arg(long, default_value_t = 10.0)]
    pub cloud_max: f64,

    /// Override the sampling buffer in metres for every input point
    #[arg(long)]
    pub buffer: Option<f64>,

    /// Radar sampling footprint in metres
    #[arg(long, default_value_t = 1000.0)]
    pub radar_buffer: f64,

    /// Band year of the land-cover classification raster
    #[arg(long, default_value_t = 2020)]
    pub landcover_year: i32,

    /// Delay between points in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request network timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_s: u64,

    /// Also write a parquet copy of the table
    #[arg(long)]
    pub parquet: bool,
}

impl EnrichArgs {
    fn config(&self) -> EnrichConfig {
        EnrichConfig {
            year: self.year,
            cloud_fraction_max: self.cloud_max,
            radar_buffer_m: self.radar_buffer,
            landcover_year: self.landcover_year,
            pacing: Duration::from_millis(self.delay_ms),
            request_timeout: Duration::from_secs(self.timeout_s),
            ..EnrichConfig::default()
        }
    }
}

pub async fn enrich(args: &EnrichArgs) -> Result<String> {
    let points = apply_buffer(point::load_points(&args.input)?, args.buffer);
    println!("Enriching {} points", points.len());

    let config = args.config();
    let source = HttpRasterSource::new(
        args.gateway.clone(),
        std::env::var(GATEWAY_KEY_VAR).ok(),
        config.request_timeout,
    )?;

    // Ctrl-C abandons the remaining queue but keeps the finished rows.
    let cancel = Arc::new(AtomicBool::new(false));
    let engine = EnrichmentEngine::new(source, config).with_cancel_flag(Arc::clone(&cancel));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let bar = create_progress_bar(points.len() as u64, "Enriching points".to_string());
    let table = match engine.enrich_with_progress(&points, &bar).await {
        Ok(table) => table,
        Err(EnrichError::Cancelled { partial, expected }) => {
            eprintln!(
                "Cancelled: {} of {} points enriched, saving partial table",
                partial.len(),
                expected
            );
            partial
        }
        Err(err) => return Err(err.into()),
    };
    bar.finish_with_message("Enrichment complete");

    let csv_path = make_output_file_name("enriched", "csv");
    export::save_csv(&table, &csv_path)?;

    if args.parquet {
        let parquet_path = make_output_file_name("enriched", "parquet");
        export::save_parquet(&table, &parquet_path)?;
        println!("Parquet copy saved to `{}`", parquet_path.display());
    }

    Ok(csv_path.to_string_lossy().to_string())
}

/// `--buffer` takes precedence over per-row `buffer_m` values.
fn apply_buffer(mut points: Vec<point::GeoPoint>, buffer: Option<f64>) -> Vec<point::GeoPoint> {
    if let Some(buffer_m) = buffer {
        for point in &mut points {
            point.buffer_m = buffer_m;
        }
    }
    points
}

// -- Tests -------------------------------------------------------------------
