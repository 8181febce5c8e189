//! Per-deployment field-mapping tables.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub const CATEGORY: &str = "category";
pub const WEIGHT: &str = "weight";
pub const FRAGILITY: &str = "fragility";
pub const STRENGTH: &str = "strength";
pub const WATER_RESISTANT: &str = "water_resistant";
pub const BIODEGRADABILITY: &str = "biodegradability";
pub const RECYCLABILITY: &str = "recyclability";
pub const COST_EFFICIENCY: &str = "cost_efficiency";
pub const PRODUCT_ID: &str = "product_id";

pub const DEFAULT_DEPLOYMENT: &str = "recommend";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Text,
    Bool,
    /// Checkbox sent as `0` / `1`.
    Flag,
}

impl FieldKind {
    pub fn is_checkbox(self) -> bool {
        matches!(self, FieldKind::Bool | FieldKind::Flag)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RequestField {
    pub name: String,
    pub key: String,
    pub input: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub default: Option<f64>,
}

impl RequestField {
    fn new(name: &str, key: &str, input: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            input: input.to_string(),
            kind,
            default: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    #[default]
    List,
    /// The body itself is a single flat prediction.
    Single,
}

fn default_list_key() -> String {
    "recommendations".to_string()
}

fn default_message_keys() -> Vec<String> {
    vec!["message".to_string()]
}

fn default_count_keys() -> Vec<String> {
    vec!["count".to_string()]
}

fn default_insight_keys() -> Vec<String> {
    vec!["aiInsight".to_string(), "ai_insight".to_string()]
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ResponseMapping {
    #[serde(default)]
    pub shape: ResponseShape,
    #[serde(default = "default_list_key")]
    pub list_key: String,
    #[serde(default)]
    pub material: Vec<String>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub cost: Vec<String>,
    #[serde(default)]
    pub co2: Vec<String>,
    #[serde(default)]
    pub score: Vec<String>,
    #[serde(default)]
    pub origin: Vec<String>,
    #[serde(default)]
    pub weight_capacity: Vec<String>,
    #[serde(default)]
    pub biodegradability: Vec<String>,
    #[serde(default)]
    pub recyclability: Vec<String>,
    #[serde(default = "default_count_keys")]
    pub count: Vec<String>,
    #[serde(default = "default_message_keys")]
    pub message: Vec<String>,
    #[serde(default = "default_insight_keys")]
    pub insight: Vec<String>,
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self {
            shape: ResponseShape::List,
            list_key: default_list_key(),
            material: Vec::new(),
            description: Vec::new(),
            cost: Vec::new(),
            co2: Vec::new(),
            score: Vec::new(),
            origin: Vec::new(),
            weight_capacity: Vec::new(),
            biodegradability: Vec::new(),
            recyclability: Vec::new(),
            count: default_count_keys(),
            message: default_message_keys(),
            insight: default_insight_keys(),
        }
    }
}

fn default_currency() -> String {
    "₹".to_string()
}

fn default_canvas() -> String {
    "impactChart".to_string()
}

fn default_co2_unit() -> String {
    "CO₂".to_string()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DisplayOptions {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub cost_suffix: Option<String>,
    #[serde(default = "default_co2_unit")]
    pub co2_unit: String,
    #[serde(default = "DisplayOptions::default_two")]
    pub cost_decimals: usize,
    #[serde(default = "DisplayOptions::default_two")]
    pub co2_decimals: usize,
    #[serde(default = "DisplayOptions::default_one")]
    pub score_decimals: usize,
    #[serde(default = "DisplayOptions::default_one")]
    pub capacity_decimals: usize,
    #[serde(default)]
    pub origin_fallback: Option<String>,
    #[serde(default = "default_canvas")]
    pub chart_canvas: String,
}

impl DisplayOptions {
    fn default_two() -> usize {
        2
    }

    fn default_one() -> usize {
        1
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            cost_suffix: None,
            co2_unit: default_co2_unit(),
            cost_decimals: 2,
            co2_decimals: 2,
            score_decimals: 1,
            capacity_decimals: 1,
            origin_fallback: None,
            chart_canvas: default_canvas(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FieldMapping {
    #[serde(default)]
    pub name: String,
    pub endpoint: String,
    pub request: Vec<RequestField>,
    #[serde(default)]
    pub response: ResponseMapping,
    #[serde(default)]
    pub display: DisplayOptions,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("unknown deployment '{name}' (known: {known})")]
    UnknownDeployment { name: String, known: String },

    #[error("deployment '{name}' has an empty endpoint")]
    EmptyEndpoint { name: String },

    #[error("deployment '{name}' declares no request fields")]
    NoRequestFields { name: String },

    #[error("deployment '{name}' declares wire key '{key}' more than once")]
    DuplicateKey { name: String, key: String },

    #[error("deployment '{name}' reads input '{input}' more than once")]
    DuplicateInput { name: String, input: String },

    #[error("deployment '{name}' uses an empty list key")]
    EmptyListKey { name: String },
}

fn keys(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl FieldMapping {
    pub fn validate(&self) -> Result<(), MappingError> {
        let name = self.name.clone();
        if self.endpoint.trim().is_empty() {
            return Err(MappingError::EmptyEndpoint { name });
        }
        if self.request.is_empty() {
            return Err(MappingError::NoRequestFields { name });
        }
        if self.response.shape == ResponseShape::List && self.response.list_key.trim().is_empty()
        {
            return Err(MappingError::EmptyListKey { name });
        }
        let mut seen_keys: HashSet<&str> = HashSet::new();
        let mut seen_inputs: HashSet<&str> = HashSet::new();
        for field in self.request.iter() {
            if !seen_keys.insert(field.key.as_str()) {
                return Err(MappingError::DuplicateKey {
                    name,
                    key: field.key.clone(),
                });
            }
            if !seen_inputs.insert(field.input.as_str()) {
                return Err(MappingError::DuplicateInput {
                    name,
                    input: field.input.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn field(&self, canonical: &str) -> Option<&RequestField> {
        self.request.iter().find(|f| f.name == canonical)
    }

    pub fn wire_keys(&self) -> Vec<&str> {
        self.request.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn recommend() -> Self {
        Self {
            name: "recommend".to_string(),
            endpoint: "/api/recommend".to_string(),
            request: vec![
                RequestField::new(CATEGORY, "product_category", "category", FieldKind::Text),
                RequestField::new(WEIGHT, "weight_kg", "weight", FieldKind::Number),
                RequestField::new(FRAGILITY, "fragility", "fragility", FieldKind::Text),
                RequestField::new(
                    WATER_RESISTANT,
                    "water_resistant",
                    "waterResistant",
                    FieldKind::Bool,
                ),
            ],
            response: ResponseMapping {
                material: keys(&["material_type", "material_name"]),
                cost: keys(&["predicted_cost_inr", "predicted_cost"]),
                co2: keys(&["predicted_co2_score", "predicted_co2"]),
                score: keys(&["final_rank_score", "suitability_score"]),
                origin: keys(&["manufacturing_place"]),
                weight_capacity: keys(&["weight_capacity_kg"]),
                biodegradability: keys(&["biodegradability_score"]),
                recyclability: keys(&["recyclability_percent", "recyclability_pct"]),
                ..ResponseMapping::default()
            },
            display: DisplayOptions {
                origin_fallback: Some("Global".to_string()),
                ..DisplayOptions::default()
            },
        }
    }

    pub fn catalog() -> Self {
        Self {
            name: "catalog".to_string(),
            endpoint: "/api/recommend".to_string(),
            request: vec![
                RequestField::new(WEIGHT, "weight_capacity_kg", "weight", FieldKind::Number),
                RequestField::new(STRENGTH, "strength", "strength", FieldKind::Number),
                RequestField::new(
                    WATER_RESISTANT,
                    "water_resistance",
                    "waterResistant",
                    FieldKind::Flag,
                ),
            ],
            response: ResponseMapping {
                material: keys(&["material_name", "material_type"]),
                description: keys(&["description"]),
                cost: keys(&["predicted_cost"]),
                co2: keys(&["predicted_co2"]),
                score: keys(&["sustainability_score"]),
                weight_capacity: keys(&["weight_capacity_kg"]),
                ..ResponseMapping::default()
            },
            display: DisplayOptions {
                score_decimals: 0,
                co2_unit: "kg".to_string(),
                ..DisplayOptions::default()
            },
        }
    }

    pub fn predict() -> Self {
        let mut request = vec![
            RequestField::new(STRENGTH, "strength_encoded", "strength_encoded", FieldKind::Number),
            RequestField::new(WEIGHT, "weight_capacity", "weight_capacity", FieldKind::Number),
            RequestField::new(
                BIODEGRADABILITY,
                "biodegradability_score",
                "biodegradability_score",
                FieldKind::Number,
            ),
            RequestField::new(
                RECYCLABILITY,
                "recyclability_percent",
                "recyclability_percent",
                FieldKind::Number,
            ),
            RequestField::new(
                COST_EFFICIENCY,
                "cost_efficiency_score",
                "cost_efficiency_score",
                FieldKind::Number,
            ),
        ];
        for field in request.iter_mut() {
            field.default = Some(0.0);
        }
        Self {
            name: "predict".to_string(),
            endpoint: "/predict".to_string(),
            request,
            response: ResponseMapping {
                shape: ResponseShape::Single,
                cost: keys(&["predicted_cost", "predicted_cost_inr_per_kg"]),
                co2: keys(&["predicted_co2", "predicted_co2_per_kg"]),
                biodegradability: keys(&["biodegradability_score"]),
                recyclability: keys(&["recyclability_percent"]),
                ..ResponseMapping::default()
            },
            display: DisplayOptions {
                currency: "₹ ".to_string(),
                cost_suffix: Some(" / kg".to_string()),
                co2_decimals: 3,
                co2_unit: "kg".to_string(),
                ..DisplayOptions::default()
            },
        }
    }

    pub fn product() -> Self {
        Self {
            name: "product".to_string(),
            endpoint: "/recommend".to_string(),
            request: vec![RequestField::new(
                PRODUCT_ID,
                "product_id",
                "product_id",
                FieldKind::Text,
            )],
            response: ResponseMapping {
                material: keys(&["material_type"]),
                cost: keys(&["predicted_cost"]),
                co2: keys(&["predicted_co2"]),
                score: keys(&["final_score", "final_rank_score"]),
                ..ResponseMapping::default()
            },
            display: DisplayOptions::default(),
        }
    }

    pub fn builtins() -> Vec<FieldMapping> {
        vec![
            Self::recommend(),
            Self::catalog(),
            Self::predict(),
            Self::product(),
        ]
    }
}

pub fn resolve(name: &str, custom: &[FieldMapping]) -> Result<FieldMapping, MappingError> {
    let wanted = name.trim().to_lowercase();
    let found = custom
        .iter()
        .find(|m| m.name.to_lowercase() == wanted)
        .cloned()
        .or_else(|| {
            FieldMapping::builtins()
                .into_iter()
                .find(|m| m.name == wanted)
        });
    match found {
        Some(mapping) => {
            mapping.validate()?;
            Ok(mapping)
        }
        None => {
            let mut known: Vec<String> = custom.iter().map(|m| m.name.clone()).collect();
            for builtin in FieldMapping::builtins() {
                if !known.contains(&builtin.name) {
                    known.push(builtin.name);
                }
            }
            Err(MappingError::UnknownDeployment {
                name: name.to_string(),
                known: known.join(", "),
            })
        }
    }
}
