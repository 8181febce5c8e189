pub mod report;

use serde::Serialize;

use crate::normalize::RecommendationResponse;
use crate::render::chart::{derive_series, ChartSeries};
use crate::render::{results_view, RankTier};
use crate::mapping::DisplayOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub rank: usize,
    pub tier: RankTier,
    pub material: Option<String>,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub cost: Option<f64>,
    pub co2: Option<f64>,
    pub origin: Option<String>,
    pub weight_capacity: Option<f64>,
    pub score_display: Option<String>,
    pub cost_display: Option<String>,
    pub co2_display: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputDocument {
    pub deployment: String,
    pub count: u64,
    pub message: Option<String>,
    pub insight: Option<String>,
    pub records: Vec<OutputRecord>,
    pub chart: ChartSeries,
}

pub fn build_document(
    deployment: &str,
    response: &RecommendationResponse,
    display: &DisplayOptions,
) -> OutputDocument {
    let view = results_view(response, display);
    let records = response
        .recommendations
        .iter()
        .zip(view.rows)
        .map(|(r, row)| OutputRecord {
            rank: row.rank,
            tier: row.tier,
            material: r.material.clone(),
            description: r.description.clone(),
            score: r.score,
            cost: r.cost,
            co2: r.co2,
            origin: row.origin,
            weight_capacity: r.weight_capacity,
            score_display: row.score,
            cost_display: row.cost,
            co2_display: row.co2,
        })
        .collect();
    OutputDocument {
        deployment: deployment.to_string(),
        count: view.count,
        message: response.message.clone(),
        insight: response.insight.clone(),
        records,
        chart: derive_series(&response.recommendations),
    }
}

pub fn render_text(doc: &OutputDocument) -> Vec<u8> {
    let mut out = String::new();
    for r in doc.records.iter() {
        let fields = [
            r.rank.to_string(),
            r.material.clone().unwrap_or_default(),
            r.score_display.clone().unwrap_or_default(),
            r.cost_display.clone().unwrap_or_default(),
            r.co2_display.clone().unwrap_or_default(),
        ];
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(doc: &OutputDocument) -> Vec<u8> {
    serde_json::to_vec_pretty(doc).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(doc: &OutputDocument) -> Vec<u8> {
    report::render_html(doc)
}

pub fn render(doc: &OutputDocument, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(doc),
        OutputFormat::Json => render_json(doc),
        OutputFormat::Html => render_html(doc),
    }
}
