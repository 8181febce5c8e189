use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::mapping::{FieldKind, FieldMapping, RequestField};

pub trait FormSource {
    fn value(&self, input: &str) -> Option<&str>;
    fn checked(&self, input: &str) -> Option<bool>;
}

#[derive(Clone, Debug, Default)]
pub struct FormValues {
    values: BTreeMap<String, String>,
    checks: BTreeMap<String, bool>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, input: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(input.to_string(), value.into());
        self
    }

    pub fn check(&mut self, input: &str, checked: bool) -> &mut Self {
        self.checks.insert(input.to_string(), checked);
        self
    }

    pub fn with(mut self, input: &str, value: impl Into<String>) -> Self {
        self.set(input, value);
        self
    }

    pub fn with_check(mut self, input: &str, checked: bool) -> Self {
        self.check(input, checked);
        self
    }

    pub fn has(&self, input: &str) -> bool {
        self.values.contains_key(input) || self.checks.contains_key(input)
    }

    /// Empties every control, keeping checkboxes bound but unchecked.
    pub fn clear(&mut self) {
        self.values.clear();
        for checked in self.checks.values_mut() {
            *checked = false;
        }
    }
}

impl FormSource for FormValues {
    fn value(&self, input: &str) -> Option<&str> {
        self.values.get(input).map(|s| s.as_str())
    }

    fn checked(&self, input: &str) -> Option<bool> {
        if let Some(checked) = self.checks.get(input) {
            return Some(*checked);
        }
        self.values
            .get(input)
            .map(|raw| parse_checkbox(raw))
    }
}

pub fn parse_checkbox(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "checked"
    )
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("form input '{input}' for field '{field}' is not bound")]
    MissingInput { field: String, input: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecommendationRequest {
    fields: Map<String, Value>,
}

impl RecommendationRequest {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn read_field(field: &RequestField, form: &impl FormSource) -> Result<Value, RequestError> {
    let missing = || RequestError::MissingInput {
        field: field.name.clone(),
        input: field.input.clone(),
    };
    let value = match field.kind {
        FieldKind::Bool => Value::Bool(form.checked(&field.input).ok_or_else(missing)?),
        FieldKind::Flag => {
            let checked = form.checked(&field.input).ok_or_else(missing)?;
            Value::Number(Number::from(u8::from(checked)))
        }
        FieldKind::Text => Value::String(form.value(&field.input).ok_or_else(missing)?.to_string()),
        FieldKind::Number => {
            let raw = form.value(&field.input).ok_or_else(missing)?;
            match coerce_number(raw).or(field.default) {
                Some(n) => number_value(n),
                None => Value::Null,
            }
        }
    };
    Ok(value)
}

pub fn build_request(
    mapping: &FieldMapping,
    form: &impl FormSource,
) -> Result<RecommendationRequest, RequestError> {
    let mut fields = Map::new();
    for field in mapping.request.iter() {
        fields.insert(field.key.clone(), read_field(field, form)?);
    }
    Ok(RecommendationRequest { fields })
}
