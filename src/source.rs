//! The upstream raster capability: query an image collection by geometry,
//! date range and filter predicates, then reduce to a scalar at a given
//! resolution. Providers depend on this abstraction only, never on a
//! concrete gateway's query language.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BandSelect {
    /// A single named band.
    Single(String),
    /// `(A - B) / (A + B)` over two named bands.
    NormalizedDifference(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Composite {
    /// Static image, no compositing.
    None,
    /// Per-pixel median over the matching scenes.
    Median,
    /// Single least-cloudy scene; ties broken by most recent acquisition.
    LeastCloudy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reducer {
    Mean,
    /// Statistical mode, for categorical rasters.
    Mode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CollectionFilter {
    /// Keep scenes whose cloudy-pixel percentage is below the threshold.
    CloudFractionMax(f64),
    PropertyEquals { property: String, value: String },
    ListContains { property: String, value: String },
}

/// One reduce-to-scalar request against an upstream dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterQuery {
    pub dataset: String,
    pub band: BandSelect,
    pub lat: f64,
    pub lon: f64,
    /// Sampling footprint radius around the point, metres.
    pub buffer_m: f64,
    /// Inclusive ISO date range; `None` for static datasets.
    pub date_range: Option<(String, String)>,
    pub filters: Vec<CollectionFilter>,
    pub composite: Composite,
    pub reducer: Reducer,
    /// Reduction resolution, metres.
    pub scale_m: f64,
}

/// The reduced result. `value: None` with `scene_count: 0` is the defined
/// "no scenes intersected the query" outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RasterValue {
    pub value: Option<f64>,
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub scene_count: u64,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("upstream quota exhausted")]
    Quota,
    #[error("upstream returned HTTP {0}")]
    Http(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

#[allow(async_fn_in_trait)]
pub trait RasterSource {
    async fn reduce(&self, query: &RasterQuery) -> Result<RasterValue, SourceError>;
}

/// JSON-over-HTTP raster gateway client with a bounded per-request timeout.
pub struct HttpRasterSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRasterSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(HttpRasterSource {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl RasterSource for HttpRasterSource {
    async fn reduce(&self, query: &RasterQuery) -> Result<RasterValue, SourceError> {
        let mut request = self
            .client
            .post(format!("{}/v1/reduce", self.base_url))
            .json(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SourceError::Quota);
        }
        if !status.is_success() {
            return Err(SourceError::Http(status.as_u16()));
        }

        response
            .json::<RasterValue>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

// -- Test stub ---------------------------------------------------------------

/// A scripted in-memory source, keyed by `dataset:band`, with call
/// recording so tests can assert how often each dataset was queried.
#[cfg(test)]
pub mod stub {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    enum Scripted {
        Value(RasterValue),
        Fail,
    }

    #[derive(Default)]
    pub struct StubSource {
        responses: HashMap<String, Scripted>,
        calls: Mutex<Vec<String>>,
    }

    pub fn query_key(query: &RasterQuery) -> String {
        match &query.band {
            BandSelect::Single(band) => format!("{}:{}", query.dataset, band),
            BandSelect::NormalizedDifference(a, b) => {
                format!("{}:{}/{}", query.dataset, a, b)
            }
        }
    }

    impl StubSource {
        pub fn new() -> Self {
            StubSource::default()
        }

        pub fn with_value(self, key: &str, value: f64) -> Self {
            self.with_raw(
                key,
                RasterValue {
                    value: Some(value),
                    scene_id: None,
                    scene_count: 1,
                },
            )
        }

        pub fn with_scene(self, key: &str, value: f64, scene_id: &str) -> Self {
            self.with_raw(
                key,
                RasterValue {
                    value: Some(value),
                    scene_id: Some(scene_id.to_string()),
                    scene_count: 1,
                },
            )
        }

        /// Scripts the "zero scenes intersected" outcome.
        pub fn with_empty(self, key: &str) -> Self {
            self.with_raw(key, RasterValue::default())
        }

        pub fn with_raw(mut self, key: &str, value: RasterValue) -> Self {
            self.responses.insert(key.to_string(), Scripted::Value(value));
            self
        }

        pub fn with_failure(mut self, key: &str) -> Self {
            self.responses.insert(key.to_string(), Scripted::Fail);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_for(&self, key: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
        }
    }

    impl RasterSource for StubSource {
        async fn reduce(&self, query: &RasterQuery) -> Result<RasterValue, SourceError> {
            self.calls.lock().unwrap().push(query_key(query));
            match self.responses.get(&query_key(query)) {
                Some(Scripted::Value(value)) => Ok(value.clone()),
                Some(Scripted::Fail) => Err(SourceError::Transport("stub failure".to_string())),
                // Unscripted keys behave like an empty collection.
                None => Ok(RasterValue::default()),
            }
        }
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialise_query_for_the_gateway() {
        let query = RasterQuery {
            dataset: "COPERNICUS/S2_SR_HARMONIZED".to_string(),
            band: BandSelect::NormalizedDifference("B8".to_string(), "B4".to_string()),
            lat: -9.5,
            lon: -67.8,
            buffer_m: 50.0,
            date_range: Some(("2023-01-01".to_string(), "2023-12-31".to_string())),
            filters: vec![CollectionFilter::CloudFractionMax(10.0)],
            composite: Composite::Median,
            reducer: Reducer::Mean,
            scale_m: 10.0,
        };

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["dataset"], "COPERNICUS/S2_SR_HARMONIZED");
        assert_eq!(json["scale_m"], 10.0);
        assert_eq!(json["band"]["NormalizedDifference"][0], "B8");
    }

    #[test]
    fn should_deserialise_minimal_gateway_response() {
        let value: RasterValue = serde_json::from_str(r#"{"value": 0.42}"#).unwrap();

        assert_eq!(value.value, Some(0.42));
        assert_eq!(value.scene_id, None);
        assert_eq!(value.scene_count, 0);
    }

    #[test]
    fn should_strip_trailing_slash_from_base_url() {
        let source = HttpRasterSource::new(
            "https://gateway.example/",
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(source.base_url, "https://gateway.example");
    }
}
