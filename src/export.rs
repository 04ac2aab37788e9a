//! Flat-file export of feature tables and comparison reports.
//!
//! CSV is the interchange format: one row per point, nulls as empty
//! fields, scene provenance columns after the feature columns. A parquet
//! copy can be written alongside for columnar consumers.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::compare::ComparisonReport;
use crate::point::GeoPoint;
use crate::table::{FeatureRecord, FeatureSchema, FeatureSpec, FeatureTable, SensorReading};

const POINT_COLUMNS: [&str; 4] = ["name", "lat", "lon", "buffer_m"];
const SCENE_SUFFIX: &str = "_scene";

pub fn save_csv(table: &FeatureTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating `{}`", path.display()))?;

    let mut header: Vec<String> = POINT_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(table.schema().names().map(str::to_string));
    for spec in table.schema().specs() {
        if spec.scene_based {
            header.push(format!("{}{}", spec.name, SCENE_SUFFIX));
        }
    }
    writer.write_record(&header)?;

    for record in table.records() {
        let point = record.point();
        let mut row = vec![
            point.name.clone(),
            point.lat.to_string(),
            point.lon.to_string(),
            point.buffer_m.to_string(),
        ];
        for reading in record.readings() {
            // Null is an empty field, never 0 or a placeholder string.
            row.push(reading.value.map(|v| v.to_string()).unwrap_or_default());
        }
        for spec in table.schema().specs() {
            if spec.scene_based {
                row.push(record.source_id(&spec.name).unwrap_or_default().to_string());
            }
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads an enriched table back from CSV. Feature columns are everything
/// after the point columns; a `<feature>_scene` column marks the feature
/// as scene-based.
pub fn load_csv(path: &Path) -> Result<FeatureTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening `{}`", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    if header.len() < POINT_COLUMNS.len() || header[..POINT_COLUMNS.len()] != POINT_COLUMNS {
        bail!(
            "`{}` is not an enriched table: expected leading columns {:?}",
            path.display(),
            POINT_COLUMNS
        );
    }

    let feature_names: Vec<&String> = header[POINT_COLUMNS.len()..]
        .iter()
        .filter(|name| !name.ends_with(SCENE_SUFFIX))
        .collect();
    let specs: Vec<FeatureSpec> = feature_names
        .iter()
        .map(|name| {
            let scene_column = format!("{name}{SCENE_SUFFIX}");
            FeatureSpec::new(name.as_str(), header.contains(&scene_column))
        })
        .collect();
    let schema = FeatureSchema::new(specs);

    let index_of = |column: &str| header.iter().position(|h| h == column);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.context("reading CSV row")?;
        let field = |column: &str| index_of(column).and_then(|i| row.get(i));

        let name = field("name").unwrap_or_default().to_string();
        let point = GeoPoint {
            name: name.clone(),
            lat: parse_required(field("lat"), "lat", &name)?,
            lon: parse_required(field("lon"), "lon", &name)?,
            buffer_m: parse_required(field("buffer_m"), "buffer_m", &name)?,
        };

        let mut readings = Vec::with_capacity(schema.len());
        for spec in schema.specs() {
            let value = parse_optional(field(&spec.name), &spec.name, &name)?;
            let source_id = if spec.scene_based {
                field(&format!("{}{}", spec.name, SCENE_SUFFIX))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            } else {
                None
            };
            readings.push(SensorReading::new(spec.name.clone(), value, source_id));
        }

        records.push(FeatureRecord::new(point, readings));
    }

    FeatureTable::new(schema, records).map_err(Into::into)
}

fn parse_required(field: Option<&str>, column: &str, point: &str) -> Result<f64> {
    let text = field.unwrap_or_default();
    text.parse::<f64>()
        .with_context(|| format!("point `{point}`: column `{column}` value `{text}` is not numeric"))
}

fn parse_optional(field: Option<&str>, column: &str, point: &str) -> Result<Option<f64>> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .with_context(|| {
                format!("point `{point}`: column `{column}` value `{text}` is not numeric")
            }),
    }
}

/// Writes the table as parquet with Snappy compression; feature columns
/// are nullable Float64, provenance columns nullable Utf8.
pub fn save_parquet(table: &FeatureTable, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating `{}`", path.display()))?;

    let mut columns: Vec<(String, ArrayRef)> = Vec::new();

    let names: Vec<String> = table.records().iter().map(|r| r.point().name.clone()).collect();
    columns.push(("name".to_string(), Arc::new(StringArray::from(names)) as ArrayRef));

    let lats: Vec<f64> = table.records().iter().map(|r| r.point().lat).collect();
    columns.push(("lat".to_string(), Arc::new(Float64Array::from(lats))));
    let lons: Vec<f64> = table.records().iter().map(|r| r.point().lon).collect();
    columns.push(("lon".to_string(), Arc::new(Float64Array::from(lons))));
    let buffers: Vec<f64> = table.records().iter().map(|r| r.point().buffer_m).collect();
    columns.push(("buffer_m".to_string(), Arc::new(Float64Array::from(buffers))));

    for spec in table.schema().specs() {
        let values = table.column(&spec.name);
        columns.push((
            spec.name.clone(),
            Arc::new(Float64Array::from(values)) as ArrayRef,
        ));
    }
    for spec in table.schema().specs() {
        if spec.scene_based {
            let scenes: Vec<Option<String>> = table
                .records()
                .iter()
                .map(|r| r.source_id(&spec.name).map(str::to_string))
                .collect();
            columns.push((
                format!("{}{}", spec.name, SCENE_SUFFIX),
                Arc::new(StringArray::from(scenes)) as ArrayRef,
            ));
        }
    }

    let batch = RecordBatch::try_from_iter(columns).context("creating record batch")?;

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

pub fn save_profile_csv(report: &ComparisonReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating `{}`", path.display()))?;

    writer.write_record(["feature", "candidate_coverage", "benchmark_z", "candidate_z"])?;
    for profile in &report.profiles {
        writer.write_record([
            profile.feature.clone(),
            format!("{:.2}", profile.coverage),
            profile.benchmark_z.map(|v| v.to_string()).unwrap_or_default(),
            profile.candidate_z.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::FeatureProfile;
    use tempfile::TempDir;

    fn sample_table() -> FeatureTable {
        let schema = FeatureSchema::new(vec![
            FeatureSpec::new("NDVI", true),
            FeatureSpec::new("Elevation", false),
        ]);
        let records = vec![
            FeatureRecord::new(
                GeoPoint::new("Tequinho", -9.8951, -67.5442),
                vec![
                    SensorReading::new("NDVI", Some(0.81), Some("S2A_SCENE".to_string())),
                    SensorReading::new("Elevation", Some(182.0), None),
                ],
            ),
            FeatureRecord::new(
                GeoPoint::new("Cloudy", -9.9, -67.4),
                vec![
                    SensorReading::null("NDVI"),
                    SensorReading::new("Elevation", Some(171.5), None),
                ],
            ),
        ];
        FeatureTable::new(schema, records).unwrap()
    }

    #[test]
    fn should_round_trip_table_through_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enriched.csv");

        save_csv(&sample_table(), &path).unwrap();
        let loaded = load_csv(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        let names: Vec<&str> = loaded.schema().names().collect();
        assert_eq!(names, vec!["NDVI", "Elevation"]);
        assert_eq!(loaded.records()[0].value("NDVI"), Some(0.81));
        assert_eq!(loaded.records()[0].source_id("NDVI"), Some("S2A_SCENE"));
        assert_eq!(loaded.records()[1].value("NDVI"), None);
        assert_eq!(loaded.records()[1].value("Elevation"), Some(171.5));
    }

    #[test]
    fn should_serialise_null_as_empty_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enriched.csv");

        save_csv(&sample_table(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let cloudy_row = text.lines().nth(2).unwrap();

        // NDVI and its scene column are empty, not "0" and not "null".
        assert_eq!(cloudy_row, "Cloudy,-9.9,-67.4,50,,171.5,");
    }

    #[test]
    fn should_reject_csv_without_point_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "site,x,y\nfoo,1,2\n").unwrap();

        assert!(load_csv(&path).is_err());
    }

    #[test]
    fn should_reject_non_numeric_feature_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "name,lat,lon,buffer_m,NDVI\nfoo,1,2,50,not-a-number\n",
        )
        .unwrap();

        assert!(load_csv(&path).is_err());
    }

    #[test]
    fn should_write_parquet_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enriched.parquet");

        save_parquet(&sample_table(), &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn should_write_profile_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.csv");
        let report = ComparisonReport {
            profiles: vec![FeatureProfile {
                feature: "NDVI".to_string(),
                coverage: 0.75,
                benchmark_z: Some(0.0),
                candidate_z: None,
            }],
        };

        save_profile_csv(&report, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("feature,candidate_coverage,benchmark_z,candidate_z"));
        assert!(text.contains("NDVI,0.75,0,"));
    }
}
