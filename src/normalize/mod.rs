use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::mapping::{ResponseMapping, ResponseShape};
use crate::request::coerce_number;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub material: Option<String>,
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub co2: Option<f64>,
    pub score: Option<f64>,
    pub origin: Option<String>,
    pub weight_capacity: Option<f64>,
    pub biodegradability: Option<f64>,
    pub recyclability: Option<f64>,
}

impl RecommendationResult {
    fn is_blank(&self) -> bool {
        self == &RecommendationResult::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendationResult>,
    pub count: Option<u64>,
    pub message: Option<String>,
    pub insight: Option<String>,
}

impl RecommendationResponse {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn display_count(&self) -> u64 {
        self.count
            .unwrap_or(self.recommendations.len() as u64)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("'{key}' is not a list")]
    InvalidList { key: String },

    #[error("'{key}' entry {index} is not an object")]
    InvalidItem { key: String, index: usize },
}

fn first_present<'a>(obj: &'a Map<String, Value>, aliases: &[String]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(key))
        .find(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, aliases: &[String]) -> Option<String> {
    match first_present(obj, aliases)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => {
            debug!(value = %other, "ignoring non-scalar text attribute");
            None
        }
    }
}

fn number_field(obj: &Map<String, Value>, aliases: &[String]) -> Option<f64> {
    match first_present(obj, aliases)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => coerce_number(s),
        other => {
            debug!(value = %other, "ignoring non-numeric attribute");
            None
        }
    }
}

fn count_field(obj: &Map<String, Value>, aliases: &[String]) -> Option<u64> {
    number_field(obj, aliases)
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
}

fn result_from(obj: &Map<String, Value>, mapping: &ResponseMapping) -> RecommendationResult {
    RecommendationResult {
        material: text_field(obj, &mapping.material),
        description: text_field(obj, &mapping.description),
        cost: number_field(obj, &mapping.cost),
        co2: number_field(obj, &mapping.co2),
        score: number_field(obj, &mapping.score),
        origin: text_field(obj, &mapping.origin),
        weight_capacity: number_field(obj, &mapping.weight_capacity),
        biodegradability: number_field(obj, &mapping.biodegradability),
        recyclability: number_field(obj, &mapping.recyclability),
    }
}

pub fn normalize(
    body: &Value,
    mapping: &ResponseMapping,
) -> Result<RecommendationResponse, NormalizeError> {
    let obj = body.as_object().ok_or(NormalizeError::NotAnObject)?;

    let recommendations = match mapping.shape {
        ResponseShape::List => match obj.get(&mapping.list_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_object()
                        .map(|o| result_from(o, mapping))
                        .ok_or_else(|| NormalizeError::InvalidItem {
                            key: mapping.list_key.clone(),
                            index,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(NormalizeError::InvalidList {
                    key: mapping.list_key.clone(),
                })
            }
        },
        ResponseShape::Single => {
            let single = result_from(obj, mapping);
            if single.is_blank() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    };

    Ok(RecommendationResponse {
        recommendations,
        count: count_field(obj, &mapping.count),
        message: text_field(obj, &mapping.message),
        insight: text_field(obj, &mapping.insight),
    })
}
