//! The generative-text oracle: an OpenAI-compatible endpoint asked for
//! site lists as structured JSON. The rest of the pipeline treats its
//! output as just another point-list producer.

use std::fmt::Write;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::point::GeoPoint;
use crate::table::FeatureTable;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

pub const BENCHMARK_PROMPT: &str = "You are an archaeologist specialized in the Amazon region.\n\
    List at least 10 known archaeological sites located in the state of Acre, Brazil, \
    including their approximate latitude and longitude.\n\
    Return ONLY a JSON object with a 'sites' key, which is a list of objects with fields: \
    name (string), lat (number), lon (number).\n\
    Focus on geoglyphs and earthworks documented in academic literature or official records.";

pub const CANDIDATE_PROMPT: &str = "You are an Amazon explorer and researcher.\n\
    Based on historical legends, indigenous oral history, and published expedition records, \
    suggest up to 5 possible locations (latitude and longitude) within the Nhamini-wi region \
    (Upper Rio Negro, near the Brazil/Colombia/Venezuela border) that could correspond to the \
    legendary trail or its unexplored sites. Focus on areas that remain little explored \
    archaeologically, according to the scientific literature.\n\
    Return ONLY a JSON object with a 'sites' key, which is a list of objects with fields: \
    name (string), lat (number), lon (number), rationale (string, max 200 characters).";

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedSite {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl SuggestedSite {
    pub fn to_point(&self) -> GeoPoint {
        GeoPoint::new(self.name.clone(), self.lat, self.lon)
    }
}

#[derive(Debug, Deserialize)]
struct SiteList {
    sites: Vec<SuggestedSite>,
}

/// One candidate the oracle judged a close match to the benchmark profile.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchJudgment {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub reason: String,
}

impl MatchJudgment {
    pub fn to_point(&self) -> GeoPoint {
        GeoPoint::new(self.name.clone(), self.lat, self.lon)
    }
}

#[derive(Debug, Deserialize)]
struct MatchList {
    matches: Vec<MatchJudgment>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

pub struct SiteOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SiteOracle {
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| anyhow!("environment variable {API_KEY_VAR} is not set"))?;

        Ok(SiteOracle {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.into(),
        })
    }

    pub async fn suggest_sites(&self, prompt: &str) -> Result<Vec<SuggestedSite>> {
        let content = self.chat(prompt).await?;
        let sites = parse_site_list(&content)?;

        // A malformed coordinate here is a producer contract violation,
        // surfaced immediately rather than at enrichment time.
        for site in &sites {
            site.to_point()
                .validate()
                .with_context(|| format!("oracle produced invalid point `{}`", site.name))?;
        }

        Ok(sites)
    }

    /// Asks the oracle which candidates are close environmental matches to
    /// the benchmark sites, judged on the summarised feature tables.
    pub async fn judge_matches(
        &self,
        benchmark: &FeatureTable,
        candidates: &FeatureTable,
    ) -> Result<Vec<MatchJudgment>> {
        let content = self.chat(&match_prompt(benchmark, candidates)).await?;
        let matches = parse_match_list(&content)?;

        for judgment in &matches {
            judgment
                .to_point()
                .validate()
                .with_context(|| format!("oracle produced invalid match `{}`", judgment.name))?;
        }

        Ok(matches)
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("sending oracle request")?
            .error_for_status()
            .context("oracle request rejected")?;

        let chat: ChatResponse = response.json().await.context("decoding oracle response")?;
        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("oracle returned no choices"))
    }
}

fn parse_site_list(content: &str) -> Result<Vec<SuggestedSite>> {
    let list: SiteList = serde_json::from_str(content)
        .with_context(|| format!("oracle content is not a site list: {content}"))?;
    Ok(list.sites)
}

fn parse_match_list(content: &str) -> Result<Vec<MatchJudgment>> {
    let list: MatchList = serde_json::from_str(content)
        .with_context(|| format!("oracle content is not a match list: {content}"))?;
    Ok(list.matches)
}

/// Builds the match-judgment prompt: benchmark feature means plus one line
/// per candidate with its raw values.
pub fn match_prompt(benchmark: &FeatureTable, candidates: &FeatureTable) -> String {
    let mut prompt = String::from(
        "You are an expert in Amazonian remote sensing and archaeology.\n\
         Below are summarised environmental parameters for documented archaeological \
         sites (benchmarks) and for candidate locations.\n\
         Judge which candidates, if any, are close environmental matches to the benchmarks.\n\
         Return ONLY a JSON object with a 'matches' key, which is a list of the closest \
         candidate(s). Each match must have: name (string), lat (number), lon (number), \
         reason (string, max 200 characters). If none are close, return an empty list.\n",
    );

    prompt.push_str("\nBenchmark stats (mean):\n");
    for (feature, mean) in feature_means(benchmark) {
        let _ = writeln!(prompt, "{feature}: {mean:.3}");
    }

    prompt.push_str("\nCandidates:\n");
    for record in candidates.records() {
        let point = record.point();
        let values: Vec<String> = record
            .readings()
            .iter()
            .map(|reading| match reading.value {
                Some(value) => format!("{}: {:.3}", reading.feature, value),
                None => format!("{}: null", reading.feature),
            })
            .collect();
        let _ = writeln!(
            prompt,
            "- {} (lat {}, lon {}): {}",
            point.name,
            point.lat,
            point.lon,
            values.join(", ")
        );
    }

    prompt
}

/// Per-feature mean over non-null values, in schema order. Features with no
/// observations are left out of the summary.
fn feature_means(table: &FeatureTable) -> Vec<(String, f64)> {
    let names: Vec<String> = table.schema().names().map(str::to_string).collect();
    names
        .into_iter()
        .filter_map(|feature| {
            let values: Vec<f64> = table.column(&feature).into_iter().flatten().collect();
            if values.is_empty() {
                None
            } else {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                Some((feature, mean))
            }
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
