//! The enriched feature table: one fixed-schema row per input point.

use thiserror::Error;

use crate::point::GeoPoint;

/// One provider observation. A `None` value means "no usable observation",
/// which is distinct from `0.0`. `source_id` carries the scene identifier
/// for scene-based sources and is `None` for static datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub feature: String,
    pub value: Option<f64>,
    pub source_id: Option<String>,
}

impl SensorReading {
    pub fn new(feature: impl Into<String>, value: Option<f64>, source_id: Option<String>) -> Self {
        SensorReading {
            feature: feature.into(),
            value,
            source_id,
        }
    }

    pub fn null(feature: impl Into<String>) -> Self {
        SensorReading::new(feature, None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: String,
    /// Scene-based features get a provenance column in exports.
    pub scene_based: bool,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, scene_based: bool) -> Self {
        FeatureSpec {
            name: name.into(),
            scene_based,
        }
    }
}

/// The fixed, ordered feature set of a run. Identical for every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    specs: Vec<FeatureSpec>,
}

impl FeatureSchema {
    pub fn new(specs: Vec<FeatureSpec>) -> Self {
        FeatureSchema { specs }
    }

    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.name.as_str())
    }

    pub fn position(&self, feature: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.name == feature)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// One enriched row. Readings are ordered by the run schema and the record
/// is immutable after assembly.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    point: GeoPoint,
    readings: Vec<SensorReading>,
}

impl FeatureRecord {
    pub fn new(point: GeoPoint, readings: Vec<SensorReading>) -> Self {
        FeatureRecord { point, readings }
    }

    pub fn point(&self) -> &GeoPoint {
        &self.point
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn value(&self, feature: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.feature == feature)
            .and_then(|r| r.value)
    }

    pub fn source_id(&self, feature: &str) -> Option<&str> {
        self.readings
            .iter()
            .find(|r| r.feature == feature)
            .and_then(|r| r.source_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record for `{point}` does not match the run schema: expected [{expected}], found [{found}]")]
pub struct SchemaError {
    pub point: String,
    pub expected: String,
    pub found: String,
}

/// The engine's sole output artifact: order-preserving, one row per point.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    schema: FeatureSchema,
    records: Vec<FeatureRecord>,
}

impl FeatureTable {
    /// Assembles a table, rejecting any record whose readings do not line up
    /// with the schema. A short or reordered record here means a provider
    /// wiring bug, which must not reach downstream statistics.
    pub fn new(schema: FeatureSchema, records: Vec<FeatureRecord>) -> Result<Self, SchemaError> {
        let expected: Vec<&str> = schema.names().collect();

        for record in &records {
            let found: Vec<&str> = record.readings.iter().map(|r| r.feature.as_str()).collect();
            if found != expected {
                return Err(SchemaError {
                    point: record.point.name.clone(),
                    expected: expected.join(", "),
                    found: found.join(", "),
                });
            }
        }

        Ok(FeatureTable { schema, records })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All values of one feature, in row order.
    pub fn column(&self, feature: &str) -> Vec<Option<f64>> {
        match self.schema.position(feature) {
            Some(index) => self
                .records
                .iter()
                .map(|record| record.readings[index].value)
                .collect(),
            None => Vec::new(),
        }
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            FeatureSpec::new("NDVI", true),
            FeatureSpec::new("Elevation", false),
        ])
    }

    fn record(name: &str, ndvi: Option<f64>, elevation: Option<f64>) -> FeatureRecord {
        FeatureRecord::new(
            GeoPoint::new(name, 0.0, 0.0),
            vec![
                SensorReading::new("NDVI", ndvi, None),
                SensorReading::new("Elevation", elevation, None),
            ],
        )
    }

    #[test]
    fn should_build_table_with_matching_records() {
        let table = FeatureTable::new(
            schema(),
            vec![record("a", Some(0.5), Some(150.0)), record("b", None, None)],
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column("NDVI"), vec![Some(0.5), None]);
        assert_eq!(table.column("Elevation"), vec![Some(150.0), None]);
    }

    #[test]
    fn should_reject_record_with_missing_feature() {
        let short = FeatureRecord::new(
            GeoPoint::new("short", 0.0, 0.0),
            vec![SensorReading::null("NDVI")],
        );
        let err = FeatureTable::new(schema(), vec![short]).unwrap_err();

        assert_eq!(err.point, "short");
        assert!(err.expected.contains("Elevation"));
    }

    #[test]
    fn should_reject_record_with_reordered_features() {
        let reordered = FeatureRecord::new(
            GeoPoint::new("swapped", 0.0, 0.0),
            vec![
                SensorReading::null("Elevation"),
                SensorReading::null("NDVI"),
            ],
        );

        assert!(FeatureTable::new(schema(), vec![reordered]).is_err());
    }

    #[test]
    fn should_keep_all_null_rows_in_schema() {
        let table = FeatureTable::new(schema(), vec![record("empty", None, None)]).unwrap();

        let names: Vec<&str> = table.schema().names().collect();
        assert_eq!(names, vec!["NDVI", "Elevation"]);
        assert_eq!(table.records()[0].value("NDVI"), None);
    }

    #[test]
    fn should_return_empty_column_for_unknown_feature() {
        let table = FeatureTable::new(schema(), vec![record("a", Some(0.1), None)]).unwrap();
        assert!(table.column("Slope").is_empty());
    }
}
